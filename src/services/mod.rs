pub mod aggregates;
pub mod catalog;
pub mod passwords;
pub mod profile_update;
pub mod profiles;
pub mod ratings;
pub mod recommendations;
pub mod users;
pub mod vector;
