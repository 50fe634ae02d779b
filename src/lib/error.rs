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

use std::io;
use thiserror::Error;

/// Fatal conditions. Any of these aborts the current decode pass.
///
/// Structural flaws in the header are not errors; see `cfbf::FlawKind`.
#[derive(Error, Debug)]
pub enum Error {
	#[error("I/O error: {0}")]
	Io(#[from] io::Error),

	#[error("short read: file reports {expected} bytes, but {actual} were read")]
	ShortRead { expected: u64, actual: u64 },

	#[error("out of range: {requested} bytes at offset {offset} exceed the buffer length of {length} bytes")]
	OutOfRange { offset: u64, requested: u64, length: u64 },

	#[error("the header contains {total} flaw(s), and at least one of them could not be repaired")]
	Unrepaired { total: u32 },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
	/// Whether this is a bounds violation on the in-memory buffer.
	pub fn is_out_of_range(&self) -> bool {
		match self {
			Error::OutOfRange { .. } => true,
			_ => false,
		}
	}
}
