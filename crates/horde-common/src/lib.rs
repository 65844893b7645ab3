pub mod lobby;
pub mod protocol;
pub mod spawn;
pub mod wave;
