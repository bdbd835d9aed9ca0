pub mod line_setup;
