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

mod fields;
mod structures;
mod tracker;

pub use self::fields::{Field, FieldSpec, Rule, Value, WordRule, HEADER_FIELDS};
pub use self::structures::{FormatVersion, Header, SectorLocation};
pub use self::structures::{HEADER_SIGNATURE, MINOR_VERSION, MAJOR_VERSIONS, BYTE_ORDER, MINI_SECTOR_SHIFT, HEADER_LENGTH};
pub use self::tracker::{ErrorTracker, FlawKind};

use crate::io::{ByteStore, Debug, Width};
use crate::io::convert::{decode_word, decode_dword};
use crate::Result;

/// A flaw that was found, and repaired, in the in-memory copy of the file.
#[derive(Clone, Debug, PartialEq)]
pub struct Flaw {
	pub kind: FlawKind,
	/// Absolute offset of the byte or field that was rewritten.
	pub offset: u64,
	pub found: u32,
	pub repaired: u32,
	/// Position within the run of identical flaw kinds, as returned by `ErrorTracker::report_flaw`.
	pub occurrence: u32,
}

/// Byte range of the FAT sector location table that follows the fixed header.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TableExtent {
	pub offset: u64,
	pub len: u64,
}

impl TableExtent {
	pub fn entries(&self) -> u64 {
		self.len / 4
	}

	/// Whether the whole table lies within the loaded file.
	pub fn is_present(&self, store: &ByteStore) -> bool {
		store.len() >= self.offset + self.len
	}
}

/// Outcome of a decode pass.
pub struct HeaderReport {
	pub header: Header,
	pub tracker: ErrorTracker,
	pub flaws: Vec<Flaw>,
	pub version: FormatVersion,
	pub fat_table: TableExtent,
}

/// Decodes, validates and repairs the header held in `store`.
/// Callers must still check `report.tracker.ensure_repaired()` afterwards.
pub fn decode_header(store: &mut ByteStore, debug: &mut Debug) -> Result<HeaderReport> {
	HeaderDecoder::new(store).run(debug)
}

/// Walks `HEADER_FIELDS` once, from the first byte of the file to the last byte of the fixed header.
///
/// Every field that violates its rule is reported to the tracker and corrected in place
/// through the `ByteStore`; only fatal errors stop the pass.
pub struct HeaderDecoder<'a> {
	store: &'a mut ByteStore,
	header: Header,
	tracker: ErrorTracker,
	flaws: Vec<Flaw>,
	version: FormatVersion,
}

impl<'a> HeaderDecoder<'a> {
	pub fn new(store: &'a mut ByteStore) -> HeaderDecoder<'a> {
		HeaderDecoder {
			store,
			header: Header::default(),
			tracker: ErrorTracker::new(),
			flaws: Vec::new(),
			version: FormatVersion::default(),
		}
	}

	pub fn run(mut self, debug: &mut Debug) -> Result<HeaderReport> {
		debug.logln(1, format!("[decode_header] Decoding CFBF file header ({} bytes) ...", HEADER_LENGTH));
		self.store.rewind();

		for spec in HEADER_FIELDS.iter() {
			debug_assert_eq!(self.store.cursor(), spec.offset);
			debug.log(1, format!("[decode_header] Reading {} at 0x{:02X} ... ", spec.name, spec.offset));
			let value = self.decode_field(spec, debug)?;
			debug.logln(1, format!("{:?}.", value));

			if let (Field::MajorVersion, &Value::Word(major)) = (spec.field, &value) {
				self.version = FormatVersion::from_major(major).unwrap_or_default();
			}
			self.header.assign(spec.field, &value);
		}

		let fat_table = TableExtent { offset: HEADER_LENGTH, len: self.version.fat_table_len() };
		debug.logln(1, format!("[decode_header] Format version {:?}, FAT sector location table holds {} entries ({} bytes at 0x{:02X}).",
			self.version, fat_table.entries(), fat_table.len, fat_table.offset));
		if !fat_table.is_present(self.store) {
			debug.logln(1, format!("[decode_header] The file ends before the FAT sector location table does ({} bytes).", self.store.len()));
		}
		debug.logln(1, format!("[decode_header] Done, {} flaw(s) found.", self.tracker.total_flaw_count()));

		Ok(HeaderReport {
			header: self.header,
			tracker: self.tracker,
			flaws: self.flaws,
			version: self.version,
			fat_table,
		})
	}

	fn decode_field(&mut self, spec: &FieldSpec, debug: &mut Debug) -> Result<Value> {
		match spec.rule {
			Rule::Bytes(expected, kind) => self.decode_bytes(spec, expected, kind, debug),
			Rule::Word(rule, kind) => {
				let raw = self.store.read_sequential(spec.count, spec.width)?;
				let value = decode_word(&raw);
				match rule.repair(value, self.version) {
					None => Ok(Value::Word(value)),
					Some(replacement) => {
						self.flag(kind, spec, spec.offset, value as u32, replacement as u32, debug);
						self.store.rewrite_last(replacement as u32, Width::Word)?;
						Ok(Value::Word(replacement))
					},
				}
			},
			Rule::ZeroUnderV3(kind) => {
				let raw = self.store.read_sequential(spec.count, spec.width)?;
				let value = decode_dword(&raw);
				if self.version == FormatVersion::V3 && value != 0 {
					self.flag(kind, spec, spec.offset, value, 0, debug);
					self.store.rewrite_at(spec.offset, 0, Width::DWord)?;
					Ok(Value::DWord(0))
				}
				else {
					Ok(Value::DWord(value))
				}
			},
			Rule::Verbatim => {
				let raw = self.store.read_sequential(spec.count, spec.width)?;
				Ok(match spec.width {
					Width::Byte => Value::Bytes(raw),
					Width::Word => Value::Word(decode_word(&raw)),
					Width::DWord => Value::DWord(decode_dword(&raw)),
				})
			},
		}
	}

	fn decode_bytes(&mut self, spec: &FieldSpec, expected: &[u8], kind: FlawKind, debug: &mut Debug) -> Result<Value> {
		if self.store.matches_at(spec.offset, expected, true) {
			return Ok(Value::Bytes(expected.to_vec()));
		}

		let mut bytes = Vec::with_capacity(expected.len());
		for (i, &wanted) in expected.iter().enumerate() {
			let found = self.store.read_sequential(1, Width::Byte)?[0];
			if found != wanted {
				self.flag(kind, spec, spec.offset + i as u64, found as u32, wanted as u32, debug);
				self.store.rewrite_last(wanted as u32, Width::Byte)?;
			}
			debug.logln(2, format!("[decode_bytes] 0x{:02X}: 0x{:02X}", spec.offset + i as u64, found));
			bytes.push(wanted);
		}
		Ok(Value::Bytes(bytes))
	}

	fn flag(&mut self, kind: FlawKind, spec: &FieldSpec, offset: u64, found: u32, repaired: u32, debug: &mut Debug) {
		let repeat = self.tracker.is_repeat_of(kind);
		let occurrence = self.tracker.report_flaw(kind, true);

		if repeat {
			debug.logln(0, format!("[{}] exception #{} at 0x{:02X}: 0x{:X}, repaired to 0x{:X}.", kind, occurrence, offset, found, repaired));
		}
		else {
			debug.logln(0, format!("[CFB header flaw] {}: the {} at 0x{:02X} was found to be 0x{:X}, when it is expected to be 0x{:X}. It has been repaired.",
				kind, spec.name, offset, found, repaired));
		}
		self.flaws.push(Flaw { kind, offset, found, repaired, occurrence });
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::Error;

	fn minimal_header() -> Vec<u8> {
		let mut data = vec![0u8; HEADER_LENGTH as usize];
		data[..8].copy_from_slice(&HEADER_SIGNATURE);
		data[0x18..0x22].copy_from_slice(&[0x3E, 0x00, 0x03, 0x00, 0xFE, 0xFF, 0x09, 0x00, 0x06, 0x00]);
		data
	}

	#[test]
	fn truncated_header_is_fatal() {
		let mut store = ByteStore::from_bytes(minimal_header()[..0x30].to_vec());
		match decode_header(&mut store, &mut Debug::silent()) {
			Err(Error::OutOfRange { offset, .. }) => assert_eq!(offset, 0x30),
			Err(e) => panic!("unexpected error: {}", e),
			Ok(_) => panic!("decoding a truncated header must fail"),
		}
	}

	#[test]
	fn decoding_starts_at_the_beginning() {
		let mut store = ByteStore::from_bytes(minimal_header());
		store.read_sequential(10, Width::Byte).unwrap();

		let report = decode_header(&mut store, &mut Debug::silent()).unwrap();
		assert_eq!(report.tracker.total_flaw_count(), 0);
		assert_eq!(store.cursor(), HEADER_LENGTH);
	}

	#[test]
	fn fat_table_extent_follows_the_version() {
		let mut store = ByteStore::from_bytes(minimal_header());
		let report = decode_header(&mut store, &mut Debug::silent()).unwrap();
		assert_eq!(report.fat_table, TableExtent { offset: 0x4C, len: 436 });
		assert_eq!(report.fat_table.entries(), 109);
		assert!(!report.fat_table.is_present(&store));
	}

	#[test]
	fn bytes_after_a_signature_flaw_are_still_checked_individually() {
		let mut data = minimal_header();
		data[1] = 0x00;
		data[6] = 0x00;
		let mut store = ByteStore::from_bytes(data);
		let report = decode_header(&mut store, &mut Debug::silent()).unwrap();

		let offsets: Vec<u64> = report.flaws.iter().map(|f| f.offset).collect();
		assert_eq!(offsets, vec![1, 6]);
		assert_eq!(report.header.signature, HEADER_SIGNATURE);
		assert_eq!(report.tracker.same_kind_run_length(), 2);
	}
}
