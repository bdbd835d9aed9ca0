pub mod channels;
pub mod console;
pub mod health;
pub mod identity;
pub mod root;
pub mod status;
