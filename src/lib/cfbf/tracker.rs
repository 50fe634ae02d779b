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

use std::collections::BTreeMap;
use std::fmt;
use crate::{Error, Result};

/// The kinds of structural flaws the header decoder knows how to detect.
/// Declared in the order the corresponding fields appear in the file.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FlawKind {
	HeaderSignature,
	Padding,
	MinorVersion,
	MajorVersion,
	ByteOrder,
	SectorSize,
	MiniSectorSize,
	Reserved,
	DirectorySectorCount,
}

impl FlawKind {
	pub fn name(self) -> &'static str {
		match self {
			FlawKind::HeaderSignature => "Invalid Header Signature",
			FlawKind::Padding => "Invalid Padding",
			FlawKind::MinorVersion => "Invalid CFB Minor Version",
			FlawKind::MajorVersion => "Invalid CFB Major Version",
			FlawKind::ByteOrder => "Invalid Little-Endian Indicator",
			FlawKind::SectorSize => "Invalid CFB Sector Size Indication",
			FlawKind::MiniSectorSize => "Invalid CFB Mini Sector Size Indication",
			FlawKind::Reserved => "Invalid Reserved Bytes",
			FlawKind::DirectorySectorCount => "Invalid Number of Directory Sectors",
		}
	}
}

impl fmt::Display for FlawKind {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// Bookkeeping of the flaws found during one decode pass.
#[derive(Clone, Debug)]
pub struct ErrorTracker {
	current: Option<FlawKind>,
	previous: Option<FlawKind>,
	same_kind_run: u32,
	total: u32,
	all_repaired: bool,
	per_kind: BTreeMap<FlawKind, u32>,
}

impl ErrorTracker {
	pub fn new() -> ErrorTracker {
		ErrorTracker {
			current: None,
			previous: None,
			same_kind_run: 0,
			total: 0,
			all_repaired: true,
			per_kind: BTreeMap::new(),
		}
	}

	/// Records a flaw and returns its position within the current run of identical flaw kinds (starting at 1).
	pub fn report_flaw(&mut self, kind: FlawKind, repairable: bool) -> u32 {
		if self.current == Some(kind) {
			self.same_kind_run += 1;
		}
		else {
			self.previous = self.current;
			self.current = Some(kind);
			self.same_kind_run = 1;
		}

		self.total += 1;
		*self.per_kind.entry(kind).or_insert(0) += 1;
		if !repairable {
			self.all_repaired = false;
		}
		self.same_kind_run
	}

	/// Whether `kind` is one of the last two distinct kinds reported.
	pub fn is_repeat_of(&self, kind: FlawKind) -> bool {
		self.total > 0 && (self.current == Some(kind) || self.previous == Some(kind))
	}

	pub fn current_kind(&self) -> Option<FlawKind> {
		self.current
	}

	pub fn previous_kind(&self) -> Option<FlawKind> {
		self.previous
	}

	pub fn same_kind_run_length(&self) -> u32 {
		self.same_kind_run
	}

	pub fn total_flaw_count(&self) -> u32 {
		self.total
	}

	pub fn all_repaired(&self) -> bool {
		self.all_repaired
	}

	pub fn count_of(&self, kind: FlawKind) -> u32 {
		self.per_kind.get(&kind).cloned().unwrap_or(0)
	}

	/// Every kind seen so far with the number of times it was reported, in field order.
	pub fn summary(&self) -> Vec<(FlawKind, u32)> {
		self.per_kind.iter().map(|(&kind, &count)| (kind, count)).collect()
	}

	/// Fails if any reported flaw was marked as not repairable.
	/// Must be called once the pass is complete.
	pub fn ensure_repaired(&self) -> Result<()> {
		if self.all_repaired {
			Ok(())
		}
		else {
			Err(Error::Unrepaired { total: self.total })
		}
	}
}

impl Default for ErrorTracker {
	fn default() -> ErrorTracker {
		ErrorTracker::new()
	}
}
