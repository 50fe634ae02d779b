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

//! Layout of the fixed 76-byte header, and what each field must look like.

use crate::io::Width;
use super::structures::{FormatVersion, HEADER_SIGNATURE, MINOR_VERSION, MAJOR_VERSIONS, BYTE_ORDER, MINI_SECTOR_SHIFT};
use super::tracker::FlawKind;

const PADDING: [u8; 16] = [0; 16];
const RESERVED: [u8; 6] = [0; 6];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Field {
	Signature,
	Padding,
	MinorVersion,
	MajorVersion,
	ByteOrder,
	SectorShift,
	MiniSectorShift,
	Reserved,
	DirectorySectorCount,
	FatSectorCount,
	FirstDirectorySectorLocation,
	TransactionSignature,
	MiniStreamCutoffSize,
	FirstMiniFatSectorLocation,
	MiniFatSectorCount,
	FirstDifatSectorLocation,
	DifatSectorCount,
}

/// A decoded field value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
	Bytes(Vec<u8>),
	Word(u16),
	DWord(u32),
}

/// Validation of a 16-bit field.
#[derive(Copy, Clone, Debug)]
pub enum WordRule {
	Equals(u16),
	/// Any of the listed values is fine; anything else is replaced by the second member.
	OneOf(&'static [u16], u16),
	/// Only the low byte is checked; a mismatch replaces the whole word, clearing the high byte.
	LowByte(u16),
	/// Like `LowByte`, with the constant depending on the format version.
	LowBytePerVersion(fn(FormatVersion) -> u16),
}

impl WordRule {
	/// Returns the value that shall replace `value`, or `None` if `value` is acceptable.
	pub fn repair(self, value: u16, version: FormatVersion) -> Option<u16> {
		let (valid, replacement) = match self {
			WordRule::Equals(expected) => (value == expected, expected),
			WordRule::OneOf(accepted, default) => (accepted.contains(&value), default),
			WordRule::LowByte(expected) => (value & 0x00FF == expected, expected),
			WordRule::LowBytePerVersion(expected) => (value & 0x00FF == expected(version), expected(version)),
		};
		if valid { None } else { Some(replacement) }
	}
}

#[derive(Copy, Clone, Debug)]
pub enum Rule {
	/// Each byte must equal the byte at the same position; checked and repaired one byte at a time.
	Bytes(&'static [u8], FlawKind),
	Word(WordRule, FlawKind),
	/// Must be zero in version 3 files; anything goes in version 4.
	ZeroUnderV3(FlawKind),
	/// Stored as is.
	Verbatim,
}

#[derive(Copy, Clone, Debug)]
pub struct FieldSpec {
	pub field: Field,
	pub name: &'static str,
	pub offset: u64,
	pub count: usize,
	pub width: Width,
	pub rule: Rule,
}

impl FieldSpec {
	pub fn len(&self) -> u64 {
		self.count as u64 * self.width.bytes()
	}
}

/// All fields of the fixed header, in file order.
pub const HEADER_FIELDS: [FieldSpec; 17] = [
	FieldSpec { field: Field::Signature, name: "header signature", offset: 0x00, count: 8, width: Width::Byte,
		rule: Rule::Bytes(&HEADER_SIGNATURE, FlawKind::HeaderSignature) },
	FieldSpec { field: Field::Padding, name: "padding", offset: 0x08, count: 16, width: Width::Byte,
		rule: Rule::Bytes(&PADDING, FlawKind::Padding) },
	FieldSpec { field: Field::MinorVersion, name: "minor version", offset: 0x18, count: 1, width: Width::Word,
		rule: Rule::Word(WordRule::Equals(MINOR_VERSION), FlawKind::MinorVersion) },
	FieldSpec { field: Field::MajorVersion, name: "major version", offset: 0x1A, count: 1, width: Width::Word,
		rule: Rule::Word(WordRule::OneOf(&MAJOR_VERSIONS, MAJOR_VERSIONS[0]), FlawKind::MajorVersion) },
	FieldSpec { field: Field::ByteOrder, name: "byte order", offset: 0x1C, count: 1, width: Width::Word,
		rule: Rule::Word(WordRule::Equals(BYTE_ORDER), FlawKind::ByteOrder) },
	FieldSpec { field: Field::SectorShift, name: "sector shift", offset: 0x1E, count: 1, width: Width::Word,
		rule: Rule::Word(WordRule::LowBytePerVersion(FormatVersion::sector_shift), FlawKind::SectorSize) },
	FieldSpec { field: Field::MiniSectorShift, name: "mini sector shift", offset: 0x20, count: 1, width: Width::Word,
		rule: Rule::Word(WordRule::LowByte(MINI_SECTOR_SHIFT), FlawKind::MiniSectorSize) },
	FieldSpec { field: Field::Reserved, name: "reserved", offset: 0x22, count: 6, width: Width::Byte,
		rule: Rule::Bytes(&RESERVED, FlawKind::Reserved) },
	FieldSpec { field: Field::DirectorySectorCount, name: "number of directory sectors", offset: 0x28, count: 1, width: Width::DWord,
		rule: Rule::ZeroUnderV3(FlawKind::DirectorySectorCount) },
	FieldSpec { field: Field::FatSectorCount, name: "number of FAT sectors", offset: 0x2C, count: 1, width: Width::DWord,
		rule: Rule::Verbatim },
	FieldSpec { field: Field::FirstDirectorySectorLocation, name: "first directory sector location", offset: 0x30, count: 1, width: Width::DWord,
		rule: Rule::Verbatim },
	FieldSpec { field: Field::TransactionSignature, name: "transaction signature number", offset: 0x34, count: 1, width: Width::DWord,
		rule: Rule::Verbatim },
	FieldSpec { field: Field::MiniStreamCutoffSize, name: "mini stream cutoff size", offset: 0x38, count: 1, width: Width::DWord,
		rule: Rule::Verbatim },
	FieldSpec { field: Field::FirstMiniFatSectorLocation, name: "first mini FAT sector location", offset: 0x3C, count: 1, width: Width::DWord,
		rule: Rule::Verbatim },
	FieldSpec { field: Field::MiniFatSectorCount, name: "number of mini FAT sectors", offset: 0x40, count: 1, width: Width::DWord,
		rule: Rule::Verbatim },
	FieldSpec { field: Field::FirstDifatSectorLocation, name: "first DIFAT sector location", offset: 0x44, count: 1, width: Width::DWord,
		rule: Rule::Verbatim },
	FieldSpec { field: Field::DifatSectorCount, name: "number of DIFAT sectors", offset: 0x48, count: 1, width: Width::DWord,
		rule: Rule::Verbatim },
];

#[cfg(test)]
mod tests {
	use super::*;
	use super::super::structures::HEADER_LENGTH;

	#[test]
	fn fields_are_contiguous_and_cover_the_header() {
		let mut offset = 0;
		for spec in HEADER_FIELDS.iter() {
			assert_eq!(spec.offset, offset, "{} does not follow its predecessor", spec.name);
			offset += spec.len();
		}
		assert_eq!(offset, HEADER_LENGTH);
	}

	#[test]
	fn word_rules() {
		let equals = WordRule::Equals(0xFFFE);
		assert_eq!(equals.repair(0xFFFE, FormatVersion::V3), None);
		assert_eq!(equals.repair(0xFEFF, FormatVersion::V3), Some(0xFFFE));

		let one_of = WordRule::OneOf(&MAJOR_VERSIONS, 3);
		assert_eq!(one_of.repair(4, FormatVersion::V3), None);
		assert_eq!(one_of.repair(0x0300, FormatVersion::V4), Some(3));

		let per_version = WordRule::LowBytePerVersion(FormatVersion::sector_shift);
		assert_eq!(per_version.repair(0x0C, FormatVersion::V3), Some(0x09));
		assert_eq!(per_version.repair(0x09, FormatVersion::V4), Some(0x0C));
		assert_eq!(per_version.repair(0x0C, FormatVersion::V4), None);
		assert_eq!(per_version.repair(0x0109, FormatVersion::V3), None);
		assert_eq!(per_version.repair(0x010C, FormatVersion::V3), Some(0x09));

		let low_byte = WordRule::LowByte(0x06);
		assert_eq!(low_byte.repair(0x0206, FormatVersion::V3), None);
		assert_eq!(low_byte.repair(0x0207, FormatVersion::V4), Some(0x06));
	}
}
