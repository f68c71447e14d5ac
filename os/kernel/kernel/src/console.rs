//! # Text console
//!
//! The shell writes through [`Terminal`]; on hardware that is a
//! [`TextConsole`] over the 80×25 VGA text buffer at `0xB8000`, where each
//! cell is a `u16`: character in the low byte, colour attribute in the high
//! byte.

use core::fmt;
use kernel_memory_addresses::PhysicalAddress;

/// Light grey on black.
pub const DEFAULT_ATTRIBUTE: u8 = 0x07;

const BLANK: u8 = b' ';

/// Output surface of the shell.
pub trait Terminal: fmt::Write {
    /// Write one byte; `\n` starts a new line, `\x08` erases backwards.
    fn put_byte(&mut self, byte: u8);

    /// Move the cursor back one cell and blank it.
    fn backspace(&mut self);

    /// Blank the screen and home the cursor.
    fn clear(&mut self);
}

/// Storage for character cells.
pub trait CellBuffer {
    fn cell_count(&self) -> usize;

    fn read_cell(&self, index: usize) -> u16;

    fn write_cell(&mut self, index: usize, cell: u16);
}

impl<const N: usize> CellBuffer for [u16; N] {
    fn cell_count(&self) -> usize {
        N
    }

    fn read_cell(&self, index: usize) -> u16 {
        self[index]
    }

    fn write_cell(&mut self, index: usize, cell: u16) {
        self[index] = cell;
    }
}

/// The memory-mapped VGA text buffer, accessed with volatile loads and stores.
#[derive(Debug)]
pub struct VgaBuffer {
    base: *mut u16,
    cells: usize,
}

impl VgaBuffer {
    /// # Safety
    /// `base` must be identity mapped, point at `cells` writable character
    /// cells, and not be accessed through anything else while this value
    /// lives.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub unsafe fn new(base: PhysicalAddress, cells: usize) -> Self {
        Self {
            base: core::ptr::with_exposed_provenance_mut(base.as_u64() as usize),
            cells,
        }
    }
}

impl CellBuffer for VgaBuffer {
    fn cell_count(&self) -> usize {
        self.cells
    }

    fn read_cell(&self, index: usize) -> u16 {
        if index >= self.cells {
            return 0;
        }
        // SAFETY: in bounds, see `new`.
        unsafe { self.base.add(index).read_volatile() }
    }

    fn write_cell(&mut self, index: usize, cell: u16) {
        if index < self.cells {
            // SAFETY: in bounds, see `new`.
            unsafe { self.base.add(index).write_volatile(cell) }
        }
    }
}

/// A scrolling text console with a software cursor.
#[derive(Debug)]
pub struct TextConsole<B> {
    buffer: B,
    columns: usize,
    rows: usize,
    column: usize,
    row: usize,
    attribute: u8,
}

impl<B: CellBuffer> TextConsole<B> {
    /// A console of `columns × rows` cells over `buffer`.
    ///
    /// The geometry is clamped to what `buffer` holds. The screen is not
    /// cleared; call [`Terminal::clear`] for that.
    pub fn new(buffer: B, columns: usize, rows: usize) -> Self {
        let columns = columns.clamp(1, buffer.cell_count().max(1));
        let rows = rows.clamp(1, (buffer.cell_count() / columns).max(1));
        Self {
            buffer,
            columns,
            rows,
            column: 0,
            row: 0,
            attribute: DEFAULT_ATTRIBUTE,
        }
    }

    /// `(column, row)` of the next cell written.
    #[must_use]
    pub const fn cursor(&self) -> (usize, usize) {
        (self.column, self.row)
    }

    #[must_use]
    pub const fn geometry(&self) -> (usize, usize) {
        (self.columns, self.rows)
    }

    pub fn set_attribute(&mut self, attribute: u8) {
        self.attribute = attribute;
    }

    /// The characters of `row`, without trailing blanks.
    #[must_use]
    pub fn line(&self, row: usize) -> Line<'_, B> {
        Line { console: self, row }
    }

    fn cell(&self, byte: u8) -> u16 {
        u16::from_le_bytes([byte, self.attribute])
    }

    fn newline(&mut self) {
        self.column = 0;
        self.row += 1;
        if self.row == self.rows {
            self.scroll();
            self.row = self.rows - 1;
        }
    }

    fn scroll(&mut self) {
        let cells = self.columns * self.rows;
        for index in self.columns..cells {
            let cell = self.buffer.read_cell(index);
            self.buffer.write_cell(index - self.columns, cell);
        }
        let blank = self.cell(BLANK);
        for index in cells - self.columns..cells {
            self.buffer.write_cell(index, blank);
        }
    }
}

impl<B: CellBuffer> Terminal for TextConsole<B> {
    fn put_byte(&mut self, byte: u8) {
        match byte {
            b'\n' => self.newline(),
            b'\r' => self.column = 0,
            0x08 => self.backspace(),
            _ => {
                let cell = self.cell(byte);
                self.buffer
                    .write_cell(self.row * self.columns + self.column, cell);
                self.column += 1;
                if self.column == self.columns {
                    self.newline();
                }
            }
        }
    }

    fn backspace(&mut self) {
        if self.column > 0 {
            self.column -= 1;
        } else if self.row > 0 {
            self.row -= 1;
            self.column = self.columns - 1;
        } else {
            return;
        }
        let blank = self.cell(BLANK);
        self.buffer
            .write_cell(self.row * self.columns + self.column, blank);
    }

    fn clear(&mut self) {
        let blank = self.cell(BLANK);
        for index in 0..self.columns * self.rows {
            self.buffer.write_cell(index, blank);
        }
        self.column = 0;
        self.row = 0;
    }
}

impl<B: CellBuffer> fmt::Write for TextConsole<B> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            let byte = u8::try_from(c).ok().filter(u8::is_ascii).unwrap_or(b'?');
            self.put_byte(byte);
        }
        Ok(())
    }
}

/// See [`TextConsole::line`].
pub struct Line<'a, B> {
    console: &'a TextConsole<B>,
    row: usize,
}

impl<B: CellBuffer> fmt::Display for Line<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let console = self.console;
        if self.row >= console.rows {
            return Ok(());
        }
        let start = self.row * console.columns;
        let bytes = (start..start + console.columns)
            .map(|index| console.buffer.read_cell(index).to_le_bytes()[0]);
        let len = bytes
            .clone()
            .rposition(|b| b != BLANK && b != 0)
            .map_or(0, |last| last + 1);
        for byte in bytes.take(len) {
            fmt::Write::write_char(f, char::from(byte))?;
        }
        Ok(())
    }
}
