use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;
use rsum_core::Progress;

const PB_STYLE: &str =
    "{spinner:.blue} {wide_msg} {bar:30.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

const PB_CHARS: &str = "█▓▒░  ";

static PB_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| {
    let pb_style = match ProgressStyle::with_template(PB_STYLE) {
        Ok(pb_style) => pb_style.tick_chars(TICK).progress_chars(PB_CHARS),
        Err(_) => return None,
    };

    Some(pb_style)
});

/// Byte progress of the file being hashed, drawn on stderr.
///
/// Clones share the same bar, so one can live in the progress callback and
/// another in the observer.
#[derive(Clone)]
pub struct ProgressTracker {
    pb: ProgressBar,
}

impl ProgressTracker {
    pub fn new() -> Self {
        let pb = ProgressBar::new(0);
        if let Some(style) = PB_TEMPLATE.as_ref() {
            pb.set_style(style.clone());
        }
        Self { pb }
    }

    pub fn start(&self, name: &str) {
        self.pb.reset();
        self.pb.set_length(0);
        self.pb.set_message(name.to_string());
    }

    pub fn update(&self, progress: &Progress) {
        self.pb.set_length(progress.total_bytes);
        self.pb.set_position(progress.bytes_done);
    }

    pub fn finish(&self) { self.pb.finish_and_clear(); }

    /// Print `line` to stdout without tearing the bar.
    pub fn println(&self, line: &str) {
        if self.pb.is_hidden() {
            println!("{line}");
        } else {
            self.pb.suspend(|| println!("{line}"));
        }
    }
}
