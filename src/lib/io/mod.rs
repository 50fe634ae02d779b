/*
cfbrepair library & toolset
Copyright (C) 2018 Steve Muller <steve.muller@outlook.com>

This program is free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with this program.  If not, see <http://www.gnu.org/licenses/>.
*/

pub mod convert;

use byteorder::{ByteOrder, LittleEndian};
use std::fs::File;
use std::io::{self as stdio, Read, Write, ErrorKind};
use std::ops::Range;
use std::path::Path;
use crate::{Error, Result};

/// Width of a single element read from or written to a `ByteStore`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Width {
	Byte = 1,
	Word = 2,
	DWord = 4,
}

impl Width {
	pub fn bytes(self) -> u64 {
		self as u64
	}
}

/// A whole file held in memory, with a read cursor.
///
/// Reads are sequential and always bounds-checked; the cursor never moves past the end of the buffer.
/// The only way to modify the buffer is through the `rewrite_*` methods, which store values in little-endian order.
pub struct ByteStore {
	data: Vec<u8>,
	index: u64,
}

impl ByteStore {
	/// Reads the entire file at `path` into memory and places the cursor at its first byte.
	pub fn load<P: AsRef<Path>>(path: P) -> Result<ByteStore> {
		let mut file = File::open(path)?;
		let expected = file.metadata()?.len();

		let mut data: Vec<u8> = Vec::new();
		data.try_reserve_exact(expected as usize)
			.map_err(|_| stdio::Error::new(ErrorKind::OutOfMemory, "unable to allocate memory for the file contents"))?;
		file.read_to_end(&mut data)?;

		let actual = data.len() as u64;
		if actual != expected {
			return Err(Error::ShortRead { expected, actual });
		}
		Ok(ByteStore { data, index: 0 })
	}

	pub fn from_bytes(data: Vec<u8>) -> ByteStore {
		ByteStore { data, index: 0 }
	}

	pub fn len(&self) -> u64 {
		self.data.len() as u64
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	/// Offset of the next byte `read_sequential` will return.
	pub fn cursor(&self) -> u64 {
		self.index
	}

	pub fn rewind(&mut self) {
		self.index = 0;
	}

	pub fn as_bytes(&self) -> &[u8] {
		&self.data
	}

	pub fn into_inner(self) -> Vec<u8> {
		self.data
	}

	/// Reads `count` elements of `width` bytes each, starting at the cursor, and advances the cursor past them.
	/// The bytes are returned in file order; no byte order conversion happens here.
	pub fn read_sequential(&mut self, count: usize, width: Width) -> Result<Vec<u8>> {
		let requested = (count as u64).saturating_mul(width.bytes());
		let range = self.range(self.index, requested)?;
		let bytes = self.data[range].to_vec();
		self.index += requested;
		Ok(bytes)
	}

	/// Overwrites the `width` bytes that precede the cursor (i.e. the element that has just been read) with `value`.
	/// The cursor ends up where it was.
	pub fn rewrite_last(&mut self, value: u32, width: Width) -> Result<()> {
		let start = match self.index.checked_sub(width.bytes()) {
			Some(start) => start,
			None => return Err(Error::OutOfRange { offset: self.index, requested: width.bytes(), length: self.len() }),
		};
		self.write_le(start, value, width)
	}

	/// Overwrites `width` bytes at the absolute `offset` with `value`, without moving the cursor.
	pub fn rewrite_at(&mut self, offset: u64, value: u32, width: Width) -> Result<()> {
		self.write_le(offset, value, width)
	}

	/// Returns the byte at the absolute `offset` without moving the cursor.
	pub fn peek_at(&self, offset: u64) -> Result<u8> {
		let range = self.range(offset, 1)?;
		Ok(self.data[range.start])
	}

	/// Compares the bytes at `offset` with `expected`.
	/// If they match and `commit` is set, the cursor is moved right behind them; otherwise it stays untouched.
	/// A range that does not fit into the buffer simply does not match.
	pub fn matches_at(&mut self, offset: u64, expected: &[u8], commit: bool) -> bool {
		let requested = expected.len() as u64;
		let matched = match self.range(offset, requested) {
			Ok(range) => &self.data[range] == expected,
			Err(_) => false,
		};
		if matched && commit {
			self.index = offset + requested;
		}
		matched
	}

	fn write_le(&mut self, offset: u64, value: u32, width: Width) -> Result<()> {
		let range = self.range(offset, width.bytes())?;
		let target = &mut self.data[range];
		match width {
			Width::Byte => target[0] = value as u8,
			Width::Word => LittleEndian::write_u16(target, value as u16),
			Width::DWord => LittleEndian::write_u32(target, value),
		}
		Ok(())
	}

	fn range(&self, offset: u64, requested: u64) -> Result<Range<usize>> {
		let length = self.len();
		match offset.checked_add(requested) {
			Some(end) if end <= length => Ok(offset as usize..end as usize),
			_ => Err(Error::OutOfRange { offset, requested, length }),
		}
	}
}

/// Verbosity-levelled diagnostic output.
///
/// Level 0 carries flaw messages, 1 per-field progress, 2 byte-level detail.
/// A negative level silences everything.
pub struct Debug {
	output: Box<dyn Write>,
	level: i8,
}

impl Debug {
	pub fn new(output: impl Write + 'static, level: i8) -> Debug {
		Debug { output: Box::new(output), level }
	}

	pub fn silent() -> Debug {
		Debug::new(stdio::sink(), -1)
	}

	pub fn enabled(&self, level: i8) -> bool {
		self.level >= level
	}

	pub fn log(&mut self, level: i8, string: String) {
		if self.enabled(level) {
			let _ = self.output.write_all(string.as_bytes());
		}
	}

	pub fn logln(&mut self, level: i8, string: String) {
		if self.enabled(level) {
			let _ = self.output.write_all(string.as_bytes());
			let _ = self.output.write_all(&[0x0A]);
		}
	}
}
