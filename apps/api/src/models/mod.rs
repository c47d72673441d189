pub mod collection;
pub mod game;
pub mod pagination;
pub mod review;
pub mod user;
