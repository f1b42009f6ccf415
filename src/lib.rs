pub mod istatrol;
pub mod poll;
