/// File persistence for log lines
///
/// One file per day under the configured log directory. Writes are buffered
/// and flushed on `flush_file_logging()` and on every error line.
use super::config::get_logger_config;
use chrono::Local;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};

struct FileSink {
    date: String,
    writer: BufWriter<File>,
}

static FILE_SINK: Lazy<Mutex<Option<FileSink>>> = Lazy::new(|| Mutex::new(None));

pub fn init_file_logging() {
    let config = get_logger_config();
    if !config.file_logging {
        return;
    }

    let date = Local::now().format("%Y-%m-%d").to_string();
    match open_log_file(&date) {
        Ok(writer) => *FILE_SINK.lock() = Some(FileSink { date, writer }),
        Err(e) => eprintln!(
            "⚠️  File logging disabled ({}): {}",
            config.log_dir.display(),
            e
        ),
    }
}

fn open_log_file(date: &str) -> std::io::Result<BufWriter<File>> {
    let config = get_logger_config();
    fs::create_dir_all(&config.log_dir)?;
    let path = config.log_dir.join(format!("supplyscan_{}.log", date));
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(BufWriter::new(file))
}

/// Append one line; rotates when the date changes. No-op before init.
pub fn write_to_file(line: &str) {
    let mut guard = FILE_SINK.lock();
    let Some(sink) = guard.as_mut() else {
        return;
    };

    let today = Local::now().format("%Y-%m-%d").to_string();
    if sink.date != today {
        let _ = sink.writer.flush();
        match open_log_file(&today) {
            Ok(writer) => {
                sink.writer = writer;
                sink.date = today;
            }
            Err(_) => {
                *guard = None;
                return;
            }
        }
    }

    let _ = writeln!(sink.writer, "{}", line);
}

pub fn flush_file_logging() {
    if let Some(sink) = FILE_SINK.lock().as_mut() {
        let _ = sink.writer.flush();
    }
}
