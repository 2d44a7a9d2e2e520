// App module - terminal host for the input pipeline
// - mod.rs: App struct, terminal setup and teardown
// - event_loop.rs: input thread loop feeding the dispatcher
// - rendering.rs: render thread, panel layout and drawing
// - runner.rs: Runner capability over the render request channel
// - procs.rs / sampler.rs: /proc readers

mod event_loop;
mod procs;
mod rendering;
mod runner;
mod sampler;

use std::io;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crossterm::{
    cursor::{Hide, Show},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::config::Options;
use crate::dispatch::{Dispatcher, Runner, TextEdit};
use crate::error::{Result, VitalsError};
use crate::input::source::Stdin;
use crate::input::{Input, Interrupt, MouseRegions};

use procs::ProcTable;
use rendering::Renderer;
use runner::ChannelRunner;

pub struct App {
    options: Arc<Mutex<Options>>,
    procs: Arc<Mutex<ProcTable>>,
    input: Input<Stdin>,
    dispatcher: Dispatcher,
    editor: TextEdit,
    runner: ChannelRunner,
    render: Option<JoinHandle<Result<()>>>,
}

impl App {
    pub fn new(options: Options) -> Result<Self> {
        enable_raw_mode().map_err(|e| VitalsError::Terminal(e.to_string()))?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen, EnableMouseCapture, Hide) {
            restore_terminal();
            return Err(VitalsError::Terminal(e.to_string()));
        }

        let backend = CrosstermBackend::new(stdout);
        let terminal = match Terminal::new(backend) {
            Ok(terminal) => terminal,
            Err(e) => {
                restore_terminal();
                return Err(VitalsError::Terminal(e.to_string()));
            }
        };

        let options = Arc::new(Mutex::new(options));
        let procs = Arc::new(Mutex::new(ProcTable::new()));
        let collecting = Arc::new(Mutex::new(()));
        let regions = MouseRegions::new();
        let interrupt = Interrupt::new();
        let (tx, rx) = crossbeam_channel::unbounded();

        let renderer = Renderer::new(
            terminal,
            rx,
            options.clone(),
            procs.clone(),
            collecting.clone(),
            regions.clone(),
            interrupt.clone(),
        );
        let render = thread::Builder::new()
            .name("render".to_string())
            .spawn(move || renderer.run());
        let render = match render {
            Ok(handle) => handle,
            Err(e) => {
                restore_terminal();
                return Err(VitalsError::Terminal(format!("Failed to spawn render thread: {}", e)));
            }
        };

        let mut input = Input::new(Stdin, regions, interrupt);
        input.clear()?;

        Ok(Self {
            options,
            procs,
            input,
            dispatcher: Dispatcher::new(),
            editor: TextEdit::default(),
            runner: ChannelRunner::new(tx, collecting, Arc::new(AtomicBool::new(false))),
            render: Some(render),
        })
    }

    /// Stops the render thread and surfaces its result.
    fn join_render(&mut self) -> Result<()> {
        let Some(handle) = self.render.take() else {
            return Ok(());
        };
        self.runner.quit();
        handle
            .join()
            .map_err(|_| VitalsError::Terminal("render thread panicked".to_string()))?
    }
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture, Show);
}

impl Drop for App {
    fn drop(&mut self) {
        if let Err(e) = self.join_render() {
            tracing::error!("Render thread failed: {}", e);
        }
        restore_terminal();
    }
}
