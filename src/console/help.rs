//! Help overlay for the presenter console.

use std::io::Write;

use anyhow::Result;
use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};

/// Help text lines for the help overlay.
pub const HELP_LINES: &[&str] = &[
    "",
    "  ╔═══════════════════════════════════════════╗",
    "  ║          termstage Presenter Keys         ║",
    "  ╠═══════════════════════════════════════════╣",
    "  ║                                           ║",
    "  ║  Steps                                    ║",
    "  ║    n l j Space Enter  Next step           ║",
    "  ║    Right Down PgDn    Next step           ║",
    "  ║    s Tab              Finish typing now   ║",
    "  ║                                           ║",
    "  ║  tmux                                     ║",
    "  ║    t Ctrl-A Ctrl-B    Enter tmux          ║",
    "  ║                       (C-b d comes back)  ║",
    "  ║    K                  Kill tmux and quit  ║",
    "  ║                                           ║",
    "  ║  General                                  ║",
    "  ║    ? h                Show this help      ║",
    "  ║    q Ctrl-C           Stop presentation   ║",
    "  ║                                           ║",
    "  ║         Press any key to close            ║",
    "  ╚═══════════════════════════════════════════╝",
    "",
];

/// Width of the help box (for centering calculations).
pub const HELP_BOX_WIDTH: usize = 47;

/// Row at which the box starts when centered vertically.
pub fn calc_help_start_row(term_height: u16) -> u16 {
    let box_height = HELP_LINES.len() as u16;
    (term_height.saturating_sub(box_height)) / 2
}

/// Column at which the box starts when centered horizontally.
pub fn calc_help_start_col(term_width: u16) -> u16 {
    ((term_width as usize).saturating_sub(HELP_BOX_WIDTH) / 2) as u16
}

/// Clear the screen and draw the centered help box.
pub fn render_help(out: &mut impl Write, width: u16, height: u16, color: Color) -> Result<()> {
    let start_row = calc_help_start_row(height);
    let col = calc_help_start_col(width);

    queue!(out, Clear(ClearType::All))?;
    for (i, line) in HELP_LINES.iter().enumerate() {
        queue!(
            out,
            MoveTo(col, start_row + i as u16),
            SetForegroundColor(color),
            Print(line),
            ResetColor,
        )?;
    }
    out.flush()?;
    Ok(())
}
