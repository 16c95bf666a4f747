pub mod status;

pub use status::{apply_status, HttpVoiceStatusWriter, VoiceStatusWriter, MAX_STATUS_LEN};
