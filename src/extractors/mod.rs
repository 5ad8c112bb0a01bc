pub mod fragment;
pub mod player_page;
pub mod quality_buttons;
