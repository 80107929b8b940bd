pub mod grid_icon;
