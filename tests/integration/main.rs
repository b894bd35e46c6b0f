//! Integration tests for termstage.

mod helpers;

mod cli_test;
mod presentation_test;
mod script_file_test;
