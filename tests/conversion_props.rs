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

use byteorder::{ByteOrder, LittleEndian};
use cfbrepair::cfbf::{decode_header, HEADER_SIGNATURE};
use cfbrepair::io::convert::{decode_dword, decode_word};
use cfbrepair::io::{ByteStore, Debug};
use proptest::prelude::*;

fn header_with_pointers(pointers: &[u32; 8]) -> Vec<u8> {
	let mut data = vec![0u8; 0x4C];
	data[..8].copy_from_slice(&HEADER_SIGNATURE);
	data[0x18..0x22].copy_from_slice(&[0x3E, 0x00, 0x03, 0x00, 0xFE, 0xFF, 0x09, 0x00, 0x06, 0x00]);
	for (i, &pointer) in pointers.iter().enumerate() {
		LittleEndian::write_u32(&mut data[0x2C + i * 4..0x30 + i * 4], pointer);
	}
	data
}

proptest! {
	#[test]
	fn merge_and_swap_agree_with_byteorder(raw in any::<[u8; 4]>()) {
		prop_assert_eq!(decode_word(&raw[..2]), LittleEndian::read_u16(&raw[..2]));
		prop_assert_eq!(decode_dword(&raw), LittleEndian::read_u32(&raw));
	}

	#[test]
	fn unvalidated_fields_are_kept_verbatim(pointers in any::<[u32; 8]>()) {
		let original = header_with_pointers(&pointers);
		let mut store = ByteStore::from_bytes(original.clone());
		let report = decode_header(&mut store, &mut Debug::silent()).unwrap();
		let header = report.header;

		prop_assert_eq!(report.tracker.total_flaw_count(), 0);
		prop_assert_eq!(store.as_bytes(), &original[..]);
		prop_assert_eq!(
			[
				header.number_of_fat_sectors,
				header.first_directory_sector_location.0,
				header.transaction_signature,
				header.mini_stream_cutoff_size,
				header.first_mini_fat_sector_location.0,
				header.number_of_mini_fat_sectors,
				header.first_difat_sector_location.0,
				header.number_of_difat_sectors,
			],
			pointers
		);
	}
}
