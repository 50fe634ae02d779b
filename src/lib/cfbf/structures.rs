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

// Also see: [MS-CFB]: Compound File Binary File Format specifications, https://msdn.microsoft.com/en-us/library/dd942138.aspx

use std::cmp::min;
use std::fmt;
use super::fields::{Field, Value};

pub const HEADER_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
pub const MINOR_VERSION: u16 = 0x003E;
pub const MAJOR_VERSIONS: [u16; 2] = [0x0003, 0x0004];
pub const BYTE_ORDER: u16 = 0xFFFE;
pub const MINI_SECTOR_SHIFT: u16 = 0x0006;

/// Length of the fixed part of the header, which is also the offset of the FAT sector location table.
pub const HEADER_LENGTH: u64 = 0x4C;

/// The two container layouts defined by the format.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FormatVersion {
	/// 512-byte sectors.
	V3,
	/// 4096-byte sectors.
	V4,
}

impl FormatVersion {
	pub fn from_major(major_version: u16) -> Option<FormatVersion> {
		match major_version {
			0x0003 => Some(FormatVersion::V3),
			0x0004 => Some(FormatVersion::V4),
			_ => None,
		}
	}

	pub fn major_version(self) -> u16 {
		match self {
			FormatVersion::V3 => 0x0003,
			FormatVersion::V4 => 0x0004,
		}
	}

	pub fn sector_shift(self) -> u16 {
		match self {
			FormatVersion::V3 => 0x0009,
			FormatVersion::V4 => 0x000C,
		}
	}

	pub fn sector_size(self) -> u64 {
		1 << self.sector_shift()
	}

	/// Number of bytes between the fixed header and the end of the header sector,
	/// holding the first 32-bit FAT sector locations.
	pub fn fat_table_len(self) -> u64 {
		match self {
			FormatVersion::V3 => 436,
			FormatVersion::V4 => 3584,
		}
	}
}

impl Default for FormatVersion {
	fn default() -> FormatVersion {
		FormatVersion::V3
	}
}

/// The header of a CFBF file, excluding the trailing DIFAT entries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Header {
	pub signature: [u8; 8],
	pub padding: [u8; 16],
	pub minor_version: u16,
	pub major_version: u16,
	pub byte_order: u16,
	pub sector_shift: u16,
	pub mini_sector_shift: u16,
	pub reserved: [u8; 6],
	pub number_of_directory_sectors: u32,
	pub number_of_fat_sectors: u32,
	pub first_directory_sector_location: SectorLocation,
	pub transaction_signature: u32,
	pub mini_stream_cutoff_size: u32,
	pub first_mini_fat_sector_location: SectorLocation,
	pub number_of_mini_fat_sectors: u32,
	pub first_difat_sector_location: SectorLocation,
	pub number_of_difat_sectors: u32,
}

impl Header {
	pub fn version(&self) -> Option<FormatVersion> {
		FormatVersion::from_major(self.major_version)
	}

	// virtual field; not actually contained in CFBF file
	pub fn sector_size(&self) -> u64 {
		1u64.checked_shl((self.sector_shift & 0x00FF) as u32).unwrap_or(0)
	}

	// virtual field; not actually contained in CFBF file
	pub fn mini_sector_size(&self) -> u64 {
		1u64.checked_shl((self.mini_sector_shift & 0x00FF) as u32).unwrap_or(0)
	}

	/// Stores a decoded value in the member that corresponds to `field`.
	pub(crate) fn assign(&mut self, field: Field, value: &Value) {
		match (field, value) {
			(Field::Signature, Value::Bytes(bytes)) => copy_prefix(&mut self.signature, bytes),
			(Field::Padding, Value::Bytes(bytes)) => copy_prefix(&mut self.padding, bytes),
			(Field::Reserved, Value::Bytes(bytes)) => copy_prefix(&mut self.reserved, bytes),
			(Field::MinorVersion, &Value::Word(v)) => self.minor_version = v,
			(Field::MajorVersion, &Value::Word(v)) => self.major_version = v,
			(Field::ByteOrder, &Value::Word(v)) => self.byte_order = v,
			(Field::SectorShift, &Value::Word(v)) => self.sector_shift = v,
			(Field::MiniSectorShift, &Value::Word(v)) => self.mini_sector_shift = v,
			(Field::DirectorySectorCount, &Value::DWord(v)) => self.number_of_directory_sectors = v,
			(Field::FatSectorCount, &Value::DWord(v)) => self.number_of_fat_sectors = v,
			(Field::FirstDirectorySectorLocation, &Value::DWord(v)) => self.first_directory_sector_location = SectorLocation(v),
			(Field::TransactionSignature, &Value::DWord(v)) => self.transaction_signature = v,
			(Field::MiniStreamCutoffSize, &Value::DWord(v)) => self.mini_stream_cutoff_size = v,
			(Field::FirstMiniFatSectorLocation, &Value::DWord(v)) => self.first_mini_fat_sector_location = SectorLocation(v),
			(Field::MiniFatSectorCount, &Value::DWord(v)) => self.number_of_mini_fat_sectors = v,
			(Field::FirstDifatSectorLocation, &Value::DWord(v)) => self.first_difat_sector_location = SectorLocation(v),
			(Field::DifatSectorCount, &Value::DWord(v)) => self.number_of_difat_sectors = v,
			(field, value) => unreachable!("field table mismatch: {:?} cannot hold {:?}", field, value),
		}
	}
}

fn copy_prefix(target: &mut [u8], bytes: &[u8]) {
	let n = min(bytes.len(), target.len());
	target[..n].copy_from_slice(&bytes[..n]);
}

/// A physical sector location in a CFBF file.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SectorLocation(pub u32);

impl SectorLocation {
	pub const MAXREGSECT: u32 = 0xFFFFFFFA;
	pub const DIFSECT: u32 = 0xFFFFFFFC;
	pub const FATSECT: u32 = 0xFFFFFFFD;
	pub const ENDOFCHAIN: u32 = 0xFFFFFFFE;
	pub const FREESECT: u32 = 0xFFFFFFFF;

	/// Whether this points to an actual sector rather than being one of the special markers.
	pub fn is_regular(self) -> bool {
		self.0 <= SectorLocation::MAXREGSECT
	}
}

impl fmt::Display for SectorLocation {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self.0 {
			SectorLocation::DIFSECT => write!(f, "DIFSECT"),
			SectorLocation::FATSECT => write!(f, "FATSECT"),
			SectorLocation::ENDOFCHAIN => write!(f, "ENDOFCHAIN"),
			SectorLocation::FREESECT => write!(f, "FREESECT"),
			n if self.is_regular() => write!(f, "#{}", n),
			n => write!(f, "0x{:08X}", n),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn version_constants() {
		assert_eq!(FormatVersion::from_major(3), Some(FormatVersion::V3));
		assert_eq!(FormatVersion::from_major(4), Some(FormatVersion::V4));
		assert_eq!(FormatVersion::from_major(0x0300), None);
		assert_eq!(FormatVersion::V3.sector_size(), 512);
		assert_eq!(FormatVersion::V4.sector_size(), 4096);
		// the table fills up the rest of the header sector
		assert_eq!(HEADER_LENGTH + FormatVersion::V3.fat_table_len(), 512);
		assert_eq!(FormatVersion::V4.fat_table_len(), 3584);
		for &major in MAJOR_VERSIONS.iter() {
			assert_eq!(FormatVersion::from_major(major).map(FormatVersion::major_version), Some(major));
		}
	}

	#[test]
	fn sector_location_display() {
		assert_eq!(SectorLocation(12).to_string(), "#12");
		assert_eq!(SectorLocation(SectorLocation::ENDOFCHAIN).to_string(), "ENDOFCHAIN");
		assert_eq!(SectorLocation(0xFFFFFFFB).to_string(), "0xFFFFFFFB");
		assert!(!SectorLocation(SectorLocation::FREESECT).is_regular());
	}

	#[test]
	fn virtual_sizes() {
		let header = Header { sector_shift: 9, mini_sector_shift: 6, major_version: 3, ..Header::default() };
		assert_eq!(header.sector_size(), 512);
		assert_eq!(header.mini_sector_size(), 64);
		assert_eq!(header.version(), Some(FormatVersion::V3));

		// only the low byte carries the shift
		let header = Header { sector_shift: 0x0109, mini_sector_shift: 0x0206, ..Header::default() };
		assert_eq!(header.sector_size(), 512);
		assert_eq!(header.mini_sector_size(), 64);
	}

	#[test]
	fn assign_stores_values_in_their_members() {
		let mut header = Header::default();
		header.assign(Field::Reserved, &Value::Bytes(vec![1, 2, 3, 4, 5, 6, 7]));
		header.assign(Field::ByteOrder, &Value::Word(0xFFFE));
		header.assign(Field::FirstDifatSectorLocation, &Value::DWord(SectorLocation::ENDOFCHAIN));

		assert_eq!(header.reserved, [1, 2, 3, 4, 5, 6]);
		assert_eq!(header.byte_order, 0xFFFE);
		assert_eq!(header.first_difat_sector_location, SectorLocation(SectorLocation::ENDOFCHAIN));
	}

	#[test]
	#[should_panic(expected = "field table mismatch")]
	fn assign_rejects_a_value_of_the_wrong_width() {
		Header::default().assign(Field::MajorVersion, &Value::DWord(3));
	}
}
