pub mod board_view;
pub mod status_bar;
