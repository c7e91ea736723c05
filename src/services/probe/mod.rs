mod dry_run;
mod probe;
mod wl_paste;
mod xclip;
mod r#trait;

pub use dry_run::DryRunBackend;
pub use probe::{ClipboardFileProbe, ClipboardProbeResult};
pub use self::r#trait::{create_clipboard_backend, ClipboardBackend};
