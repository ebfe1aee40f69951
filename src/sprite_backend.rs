//! A crossterm backend that paints kitty images on top of the cell buffer.
//!
//! Components register placements while rendering; after ratatui flushes the
//! cells, the backend deletes placements that moved or vanished and emits
//! the new ones.

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use crossterm::{cursor::MoveTo, queue, style::Print};
use ratatui::backend::{Backend, ClearType, CrosstermBackend, WindowSize};
use ratatui::buffer::Cell;
use ratatui::layout::{Position, Size};

/// Image id of the detail page's main sprite.
pub const PRIMARY_SPRITE_ID: u32 = 1;
/// Image id of the selected evolution node.
pub const EVOLUTION_SPRITE_ID: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub x: u16,
    pub y: u16,
    pub sequence: String,
}

/// Placements for the frame being rendered, keyed by image id.
#[derive(Default, Debug, Clone)]
pub struct SpriteRegistry {
    placements: HashMap<u32, Placement>,
}

impl SpriteRegistry {
    pub fn place(&mut self, id: u32, x: u16, y: u16, sequence: String) {
        self.placements.insert(id, Placement { x, y, sequence });
    }

    pub fn clear(&mut self) {
        self.placements.clear();
    }

    pub fn snapshot(&self) -> HashMap<u32, Placement> {
        self.placements.clone()
    }
}

static REGISTRY: OnceLock<Arc<Mutex<SpriteRegistry>>> = OnceLock::new();

pub fn sprite_registry() -> Arc<Mutex<SpriteRegistry>> {
    Arc::clone(REGISTRY.get_or_init(|| Arc::new(Mutex::new(SpriteRegistry::default()))))
}

fn lock(registry: &Mutex<SpriteRegistry>) -> MutexGuard<'_, SpriteRegistry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn place_sprite(id: u32, x: u16, y: u16, sequence: String) {
    lock(&sprite_registry()).place(id, x, y, sequence);
}

pub fn clear_sprites() {
    lock(&sprite_registry()).clear();
}

fn delete_sequence(id: u32) -> String {
    format!("\x1b_Ga=d,d=i,i={id}\x1b\\")
}

pub struct SpriteBackend<W: Write> {
    inner: CrosstermBackend<W>,
    registry: Arc<Mutex<SpriteRegistry>>,
    shown: HashMap<u32, Placement>,
}

impl<W: Write> SpriteBackend<W> {
    pub fn new(writer: W, registry: Arc<Mutex<SpriteRegistry>>) -> Self {
        Self {
            inner: CrosstermBackend::new(writer),
            registry,
            shown: HashMap::new(),
        }
    }

    fn sync_placements(&mut self) -> io::Result<()> {
        let wanted = lock(&self.registry).snapshot();
        for (id, shown) in &self.shown {
            if wanted.get(id) != Some(shown) {
                queue!(self.inner, Print(delete_sequence(*id)))?;
            }
        }
        for (id, placement) in &wanted {
            if self.shown.get(id) != Some(placement) {
                queue!(
                    self.inner,
                    MoveTo(placement.x, placement.y),
                    Print(&placement.sequence)
                )?;
            }
        }
        self.shown = wanted;
        Ok(())
    }
}

impl<W: Write> Backend for SpriteBackend<W> {
    fn draw<'a, I>(&mut self, content: I) -> io::Result<()>
    where
        I: Iterator<Item = (u16, u16, &'a Cell)>,
    {
        self.inner.draw(content)?;
        self.sync_placements()
    }

    fn append_lines(&mut self, n: u16) -> io::Result<()> {
        self.inner.append_lines(n)
    }

    fn hide_cursor(&mut self) -> io::Result<()> {
        self.inner.hide_cursor()
    }

    fn show_cursor(&mut self) -> io::Result<()> {
        self.inner.show_cursor()
    }

    fn get_cursor_position(&mut self) -> io::Result<Position> {
        self.inner.get_cursor_position()
    }

    fn set_cursor_position<P: Into<Position>>(&mut self, position: P) -> io::Result<()> {
        self.inner.set_cursor_position(position)
    }

    fn clear(&mut self) -> io::Result<()> {
        self.inner.clear()
    }

    fn clear_region(&mut self, clear_type: ClearType) -> io::Result<()> {
        self.inner.clear_region(clear_type)
    }

    fn size(&self) -> io::Result<Size> {
        self.inner.size()
    }

    fn window_size(&mut self) -> io::Result<WindowSize> {
        self.inner.window_size()
    }

    fn flush(&mut self) -> io::Result<()> {
        Backend::flush(&mut self.inner)
    }
}

impl<W: Write> Write for SpriteBackend<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Write::flush(&mut self.inner)
    }
}
