use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Success,
}

/// Row position attached to per-row progress events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowStep {
    /// 1-based.
    pub index: usize,
    pub total: usize,
    pub part_number: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub message: String,
    pub severity: Severity,
    pub step: Option<RowStep>,
}

impl ProgressEvent {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        ProgressEvent {
            message: message.into(),
            severity,
            step: None,
        }
    }

    pub fn row(index: usize, total: usize, part_number: &str) -> Self {
        ProgressEvent {
            message: format!("Processing {}/{}: {}...", index, total, part_number),
            severity: Severity::Info,
            step: Some(RowStep {
                index,
                total,
                part_number: part_number.to_string(),
            }),
        }
    }
}

#[derive(Debug)]
enum Message {
    Event(ProgressEvent),
    /// Close any live progress bar, then acknowledge.
    Settle(oneshot::Sender<()>),
}

/// Producer half handed to the pipeline. Sending never blocks; events sent
/// after the consumer has gone away are dropped.
#[derive(Debug, Clone)]
pub struct ProgressSender(Option<UnboundedSender<Message>>);

impl ProgressSender {
    /// A sender whose events go nowhere.
    #[cfg(test)]
    pub fn disabled() -> Self {
        ProgressSender(None)
    }

    pub fn send(&self, event: ProgressEvent) {
        if let Some(tx) = &self.0 {
            let _ = tx.send(Message::Event(event));
        }
    }

    /// Wait until the consumer has taken the progress bar off the terminal.
    ///
    /// Call before writing anything else to the terminal. The receiver must
    /// be drained concurrently, otherwise this never returns.
    pub async fn settle(&self) {
        let Some(tx) = &self.0 else {
            return;
        };
        let (ack, done) = oneshot::channel();
        if tx.send(Message::Settle(ack)).is_ok() {
            let _ = done.await;
        }
    }
}

/// Consumer half of the progress channel.
#[derive(Debug)]
pub struct ProgressReceiver(UnboundedReceiver<Message>);

impl ProgressReceiver {
    /// Next event, acknowledging settle requests along the way. `None` once
    /// every sender is dropped.
    #[cfg(test)]
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        loop {
            match self.0.recv().await? {
                Message::Event(event) => return Some(event),
                Message::Settle(ack) => {
                    let _ = ack.send(());
                }
            }
        }
    }
}

pub fn channel() -> (ProgressSender, ProgressReceiver) {
    let (tx, rx) = unbounded_channel();
    (ProgressSender(Some(tx)), ProgressReceiver(rx))
}

/// Drain progress events onto stderr until every sender is dropped.
///
/// Row events drive a progress bar; everything else is printed as a colored
/// status line.
pub async fn render(mut events: ProgressReceiver, quiet: bool) {
    let mut bar: Option<ProgressBar> = None;

    while let Some(message) = events.0.recv().await {
        let event = match message {
            Message::Event(event) => event,
            Message::Settle(ack) => {
                if let Some(pb) = bar.take() {
                    pb.finish_and_clear();
                }
                let _ = ack.send(());
                continue;
            }
        };

        if quiet && event.severity != Severity::Error {
            continue;
        }

        if let Some(step) = &event.step {
            let pb = bar.get_or_insert_with(|| new_bar(step.total as u64));
            pb.set_position(step.index.saturating_sub(1) as u64);
            pb.set_message(step.part_number.clone());
            continue;
        }

        let line = match event.severity {
            Severity::Info => event.message.dimmed().to_string(),
            Severity::Warning => format!("{} {}", "⚠".yellow(), event.message.yellow()),
            Severity::Error => format!("{} {}", "✗".red(), event.message.red()),
            Severity::Success => format!("{} {}", "✓".green(), event.message.green()),
        };

        match &bar {
            Some(pb) => pb.println(format!("  {}", line)),
            None => eprintln!("  {}", line),
        }
    }

    if let Some(pb) = bar {
        pb.abandon();
    }
}

fn new_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}
