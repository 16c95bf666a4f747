pub mod set_voice_status;
pub mod shutdown;

pub use set_voice_status::set_voice_status;
pub use shutdown::shutdown;
