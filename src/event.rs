use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use tokio::sync::mpsc;

use crate::error::{AppError, Result};

/// Application events.
#[derive(Debug)]
pub enum Event {
    /// A key press event.
    Key(KeyEvent),
    /// A periodic tick, used to expire status messages.
    Tick,
    /// Terminal resize event.
    Resize,
}

/// Async event handler that polls crossterm events and forwards them via a channel.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    /// Create a new EventHandler with the given tick rate.
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            loop {
                let event = match event::poll(tick_rate) {
                    Ok(true) => match event::read() {
                        // Windows reports releases too.
                        Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                            Event::Key(key)
                        }
                        Ok(CrosstermEvent::Resize(_, _)) => Event::Resize,
                        Ok(_) => continue,
                        Err(e) => {
                            tracing::error!(error = %e, "reading terminal event failed");
                            break;
                        }
                    },
                    Ok(false) => Event::Tick,
                    Err(e) => {
                        tracing::error!(error = %e, "polling terminal events failed");
                        break;
                    }
                };
                if tx.send(event).is_err() {
                    break;
                }
            }
        });

        Self { rx }
    }

    /// Receive the next event (blocks until available).
    pub async fn next(&mut self) -> Result<Event> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| AppError::Terminal("Event channel closed".into()))
    }
}
