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

//! Conversion of raw bytes (in the order they were read) into numeric header values.

/// An unsigned integer that a run of raw bytes can be merged into.
pub trait Merge: Copy {
	const WIDTH: usize;

	fn truncate(value: u32) -> Self;

	fn swap(self) -> Self;
}

impl Merge for u16 {
	const WIDTH: usize = 2;

	fn truncate(value: u32) -> u16 {
		value as u16
	}

	fn swap(self) -> u16 {
		self.swap_bytes()
	}
}

impl Merge for u32 {
	const WIDTH: usize = 4;

	fn truncate(value: u32) -> u32 {
		value
	}

	fn swap(self) -> u32 {
		self.swap_bytes()
	}
}

/// Concatenates `bytes` into an integer, the first byte becoming the most significant one.
/// Bytes beyond the width of `T` are ignored.
pub fn merge_bytes<T: Merge>(bytes: &[u8]) -> T {
	let merged = bytes
		.iter()
		.take(T::WIDTH)
		.fold(0u32, |acc, &byte| (acc << 8) | byte as u32);
	T::truncate(merged)
}

/// Reverses the byte order of `value`.
/// Applied to the result of `merge_bytes`, this yields the little-endian interpretation of the original bytes.
pub fn to_little_endian<T: Merge>(value: T) -> T {
	value.swap()
}

/// Interprets two bytes in file order as a little-endian 16-bit value.
pub fn decode_word(raw: &[u8]) -> u16 {
	to_little_endian(merge_bytes::<u16>(raw))
}

/// Interprets four bytes in file order as a little-endian 32-bit value.
pub fn decode_dword(raw: &[u8]) -> u32 {
	to_little_endian(merge_bytes::<u32>(raw))
}

#[cfg(test)]
mod tests {
	use super::*;
	use byteorder::{ByteOrder, LittleEndian};

	#[test]
	fn merge_is_big_endian() {
		assert_eq!(merge_bytes::<u16>(&[0x3E, 0x00]), 0x3E00);
		assert_eq!(merge_bytes::<u32>(&[0x01, 0x02, 0x03, 0x04]), 0x01020304);
		assert_eq!(merge_bytes::<u16>(&[0xFE, 0xFF, 0x01]), 0xFEFF);
	}

	#[test]
	fn swap_yields_little_endian() {
		assert_eq!(to_little_endian(0x3E00u16), 0x003E);
		assert_eq!(to_little_endian(0x01020304u32), 0x04030201);
	}

	#[test]
	fn decode_matches_byteorder() {
		let raw = [0xFE, 0xFF, 0x09, 0x00];
		assert_eq!(decode_word(&raw[..2]), LittleEndian::read_u16(&raw[..2]));
		assert_eq!(decode_word(&raw[..2]), 0xFFFE);
		assert_eq!(decode_dword(&raw), LittleEndian::read_u32(&raw));
	}
}
