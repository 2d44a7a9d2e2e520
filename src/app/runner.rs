use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crossbeam_channel::Sender;

use crate::dispatch::Runner;
use crate::error::{Result, VitalsError};
use crate::panel::Panel;

/// Work for the render thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderRequest {
    Panel {
        panel: Panel,
        no_update: bool,
        force_redraw: bool,
    },
    Resize { force: bool },
    Quit,
}

/// `Runner` backed by the render thread's request channel.
#[derive(Debug, Clone)]
pub struct ChannelRunner {
    tx: Sender<RenderRequest>,
    /// Held by the render thread while it samples processes.
    collecting: Arc<Mutex<()>>,
    quit: Arc<AtomicBool>,
}

impl ChannelRunner {
    pub fn new(tx: Sender<RenderRequest>, collecting: Arc<Mutex<()>>, quit: Arc<AtomicBool>) -> Self {
        Self { tx, collecting, quit }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit.load(Ordering::Acquire)
    }

    fn send(&self, request: RenderRequest) -> Result<()> {
        self.tx
            .send(request)
            .map_err(|_| VitalsError::Collaborator("render thread is gone".to_string()))
    }
}

impl Runner for ChannelRunner {
    fn run(&self, panel: Panel, no_update: bool, force_redraw: bool) -> Result<()> {
        self.send(RenderRequest::Panel {
            panel,
            no_update,
            force_redraw,
        })
    }

    fn resize(&self, force: bool) -> Result<()> {
        self.send(RenderRequest::Resize { force })
    }

    fn wait_idle(&self) {
        drop(self.collecting.lock().unwrap_or_else(|e| e.into_inner()));
    }

    fn quit(&self) {
        self.quit.store(true, Ordering::Release);
        // The render thread may already have exited.
        let _ = self.tx.send(RenderRequest::Quit);
    }
}
