pub mod filter_input;
pub mod navbar;
pub mod pane;
pub mod player_bar;
pub mod scrollable_list;
pub mod status_bar;
pub mod toast;
