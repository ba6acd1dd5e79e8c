mod canvas;
mod renderer;

pub use canvas::{Canvas, GridCell, PathType};
pub use renderer::Renderer;

use std::{
    io::{Stdout, Write},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::{Receiver, SyncSender},
    },
    thread::JoinHandle,
    time::{Duration, Instant},
};

use crossterm::{
    cursor,
    event::{self, KeyCode},
    queue,
    terminal::{self, ClearType},
};

use crate::{
    generators::{GenerationEvent, Generator, GeneratorOptions, MazeGenerator, rng_from_seed},
    maze::WallSet,
};

/// What the user asked for from the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UserAction {
    /// Abandon the current run and start a new one
    Regenerate,
    /// Leave the app
    Exit,
    /// Terminal was resized
    Redraw,
}

/// How one animated run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunOutcome {
    Finished,
    Regenerate,
    Exit,
}

/// Everything needed to start a generation run
#[derive(Debug, Clone, Copy)]
pub struct RunConfig {
    pub width: u16,
    pub height: u16,
    pub generator: Generator,
    pub options: GeneratorOptions,
    /// Seed of the first run; each regeneration uses the next one
    pub seed: Option<u64>,
}

pub struct App {
    /// Pause between two rendered events
    step_delay: Duration,
    /// How often to check for input while waiting on the compute thread
    input_poll_timeout: Duration,
}

impl Default for App {
    fn default() -> Self {
        Self {
            step_delay: Duration::from_millis(20),
            input_poll_timeout: Duration::from_millis(100),
        }
    }
}

impl App {
    /// Maximum number of generation events to buffer in the channel between compute and render threads
    const MAX_EVENTS_IN_CHANNEL_BUFFER: usize = 1000;

    pub fn new(step_delay: Duration) -> Self {
        Self {
            step_delay,
            ..Default::default()
        }
    }

    /// Set a panic hook to restore terminal state on panic
    /// This ensures that the terminal is not left in raw mode or alternate screen on panic
    /// even if the panic occurs in a different thread
    fn set_panic_hook() {
        let hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            let _ = App::restore_terminal(&mut std::io::stdout());
            hook(panic_info);
        }));
    }

    /// Setup terminal in raw mode and enter alternate screen
    /// Also sets a panic hook to restore terminal on panic
    pub fn setup_terminal(stdout: &mut Stdout) -> std::io::Result<()> {
        terminal::enable_raw_mode()?;
        App::set_panic_hook();
        queue!(
            stdout,
            terminal::EnterAlternateScreen,
            terminal::Clear(ClearType::All),
            cursor::Hide,
            cursor::MoveTo(0, 0)
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Restore terminal to original state
    /// Leave alternate screen and disable raw mode
    pub fn restore_terminal(stdout: &mut Stdout) -> std::io::Result<()> {
        queue!(stdout, terminal::LeaveAlternateScreen, cursor::Show)?;
        stdout.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    /// Main application loop: animate runs until the user exits
    pub fn run(&self, config: RunConfig) -> anyhow::Result<()> {
        tracing::info!("[app loop] started with {:?}", config);
        let mut seed = config.seed;
        loop {
            let outcome = self.animate(&config, seed)?;
            tracing::debug!("[app loop] run ended with {:?}", outcome);
            match outcome {
                RunOutcome::Exit => break,
                RunOutcome::Regenerate | RunOutcome::Finished => {
                    seed = seed.map(|s| s.wrapping_add(1));
                }
            }
        }
        tracing::info!("[app loop] exiting");
        Ok(())
    }

    /// Animate one run, then wait for the user to regenerate or exit
    fn animate(&self, config: &RunConfig, seed: Option<u64>) -> anyhow::Result<RunOutcome> {
        // Started here so invalid options surface before any thread is spawned
        let run = config.generator.start(
            config.width,
            config.height,
            &config.options,
            rng_from_seed(seed),
        )?;

        let mut renderer = Renderer::new(config.generator, config.width, config.height);
        renderer.draw_all()?;
        let seed_label = seed.map_or_else(|| "random".to_string(), |s| s.to_string());
        renderer.draw_status(&format!(
            "{} on {}x{} (seed {})",
            config.generator, config.width, config.height, seed_label
        ))?;

        let (event_tx, event_rx) =
            std::sync::mpsc::sync_channel::<GenerationEvent>(App::MAX_EVENTS_IN_CHANNEL_BUFFER);
        let cancel = Arc::new(AtomicBool::new(false));
        let cancel_for_compute = cancel.clone();
        let compute_thread_handle =
            std::thread::spawn(move || App::compute(run, event_tx, &cancel_for_compute));

        let started = Instant::now();
        let (outcome, events) = self.render_loop(&mut renderer, &event_rx)?;

        if outcome != RunOutcome::Finished {
            // Unblock the compute thread if it is waiting on a full channel
            cancel.store(true, Ordering::Relaxed);
            drop(event_rx);
            App::join(compute_thread_handle)?;
            tracing::info!("[app loop] run abandoned after {} events", events);
            return Ok(outcome);
        }

        let Some(maze) = App::join(compute_thread_handle)? else {
            anyhow::bail!("compute thread stopped before the run finished");
        };
        let perfect = maze.is_perfect();
        tracing::info!(
            "[app loop] {} finished in {:?}: {} events, {} passages, perfect = {}",
            config.generator,
            started.elapsed(),
            events,
            maze.open_count(),
            perfect
        );
        renderer.draw_status(&format!(
            "{} done: {} passages, {}",
            config.generator,
            maze.open_count(),
            if perfect { "perfect maze" } else { "NOT a perfect maze" }
        ))?;

        loop {
            match App::wait_for_action(self.input_poll_timeout)? {
                UserAction::Redraw => {
                    renderer.draw_all()?;
                }
                UserAction::Regenerate => return Ok(RunOutcome::Finished),
                UserAction::Exit => return Ok(RunOutcome::Exit),
            }
        }
    }

    /// Draw events as they arrive, pacing them and reacting to input in between.
    /// Returns how the run ended and the number of events drawn.
    fn render_loop(
        &self,
        renderer: &mut Renderer,
        event_rx: &Receiver<GenerationEvent>,
    ) -> std::io::Result<(RunOutcome, usize)> {
        let mut events = 0;
        loop {
            if event::poll(self.step_delay)? {
                match App::read_action()? {
                    Some(UserAction::Regenerate) => return Ok((RunOutcome::Regenerate, events)),
                    Some(UserAction::Exit) => return Ok((RunOutcome::Exit, events)),
                    Some(UserAction::Redraw) => {
                        renderer.draw_all()?;
                    }
                    None => {}
                }
            }
            match event_rx.recv() {
                Ok(event) => {
                    renderer.render_event(&event)?;
                    events += 1;
                }
                // Compute thread dropped its sender: the run is complete
                Err(_) => return Ok((RunOutcome::Finished, events)),
            }
        }
    }

    /// Drain the generator into the channel.
    /// Returns the finished maze, or None if the run was cancelled.
    fn compute(
        mut run: Box<dyn MazeGenerator + Send>,
        event_tx: SyncSender<GenerationEvent>,
        cancel: &AtomicBool,
    ) -> Option<WallSet> {
        for event in run.by_ref() {
            if cancel.load(Ordering::Relaxed) || event_tx.send(event).is_err() {
                tracing::debug!("[compute] run cancelled");
                return None;
            }
        }
        Some(run.maze())
        // event_tx is dropped here, which ends the render loop
    }

    fn join(handle: JoinHandle<Option<WallSet>>) -> anyhow::Result<Option<WallSet>> {
        handle
            .join()
            .map_err(|_| anyhow::anyhow!("compute thread panicked"))
    }

    /// Read the next terminal event and map it to a user action, if any
    fn read_action() -> std::io::Result<Option<UserAction>> {
        Ok(match event::read()? {
            event::Event::Key(key_event) if key_event.kind == event::KeyEventKind::Press => {
                match key_event.code {
                    KeyCode::Esc | KeyCode::Char('q') => Some(UserAction::Exit),
                    KeyCode::Char('r') => Some(UserAction::Regenerate),
                    _ => None,
                }
            }
            event::Event::Resize(_, _) => Some(UserAction::Redraw),
            _ => None,
        })
    }

    /// Block until the user does something we react to
    fn wait_for_action(poll_timeout: Duration) -> std::io::Result<UserAction> {
        loop {
            if event::poll(poll_timeout)? {
                if let Some(action) = App::read_action()? {
                    return Ok(action);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_compute(
        generator: Generator,
        size: u16,
        capacity: usize,
    ) -> (
        JoinHandle<Option<WallSet>>,
        Receiver<GenerationEvent>,
        Arc<AtomicBool>,
    ) {
        let run = generator
            .start(size, size, &GeneratorOptions::default(), rng_from_seed(Some(3)))
            .unwrap();
        let (event_tx, event_rx) = std::sync::mpsc::sync_channel(capacity);
        let cancel = Arc::new(AtomicBool::new(false));
        let cancel_for_compute = cancel.clone();
        let handle = std::thread::spawn(move || App::compute(run, event_tx, &cancel_for_compute));
        (handle, event_rx, cancel)
    }

    #[test]
    fn test_cancelled_run_returns_no_maze() {
        // A small channel keeps the compute thread blocked on send
        let (handle, event_rx, cancel) = spawn_compute(Generator::Wilson, 60, 4);
        for _ in 0..10 {
            assert!(event_rx.recv().is_ok());
        }
        cancel.store(true, Ordering::Relaxed);
        drop(event_rx);
        assert!(App::join(handle).unwrap().is_none());
    }

    #[test]
    fn test_drained_run_returns_the_maze() {
        let (handle, event_rx, _cancel) = spawn_compute(Generator::Wilson, 12, 4);
        let events = event_rx.iter().count();
        assert!(events > 0);
        let maze = App::join(handle).unwrap().unwrap();
        assert!(maze.is_perfect());
        assert_eq!(maze.open_count(), 12 * 12 - 1);
    }
}
