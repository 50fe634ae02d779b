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

extern crate clap;
extern crate cfbrepair;

use std::io::stderr;
use clap::{Arg, App, ArgMatches};
use cfbrepair::cfbf::{decode_header, Header, HeaderReport};
use cfbrepair::io::{ByteStore, Debug};
use cfbrepair::Result;

struct Options {
	input: String,
	verbose: i8,
	print_header: bool,
	quiet: bool,
}

impl Options {
	fn from_matches(matches: &ArgMatches) -> Options {
		Options {
			// required argument, so clap guarantees its presence
			input: matches.value_of("input").unwrap_or_default().to_owned(),
			verbose: matches.occurrences_of("verbose") as i8,
			print_header: matches.is_present("header"),
			quiet: matches.is_present("quiet"),
		}
	}
}

fn main() {
	let matches = App::new("cfbrepair")
		.version("0.1")
		.author("Steve Muller <steve.muller@outlook.com>")
		.about("This utility reads the header of a Compound File Binary File Format file (such as a legacy .doc file), validates it and repairs malformed fields in memory. The file on disk is never modified.")
		.arg(Arg::with_name("verbose")
			.short("v")
			.help("Increases the debug verbosity. This will print a lot of debug messages to standard error (STDERR). Can be used up to 2 times.")
			.multiple(true)
			.takes_value(false))
		.arg(Arg::with_name("header")
			.long("header")
			.help("Prints the decoded (and repaired) header fields to STDOUT.")
			.takes_value(false))
		.arg(Arg::with_name("quiet")
			.short("q")
			.long("quiet")
			.help("Does not print the summary of flaws found.")
			.takes_value(false))
		.arg(Arg::with_name("input")
			.value_name("FILE")
			.help("A file in Compound File Binary File Format (CFBF).")
			.required(true)
			.validator(validate_input))
	.get_matches();

	let options = Options::from_matches(&matches);
	let mut debug = Debug::new(stderr(), options.verbose);

	if let Err(e) = process(&options, &mut debug) {
		eprintln!("ERROR: {}", e);
		std::process::exit(1);
	}
}

fn validate_input(input: String) -> std::result::Result<(), String> {
	match input.chars().next() {
		Some(c) if c.is_ascii_alphabetic() => Ok(()),
		Some(c) => Err(format!("the file name needs to start with an ASCII letter, got '{}'", c)),
		None => Err(String::from("the file name must not be empty")),
	}
}

fn process(options: &Options, debug: &mut Debug) -> Result<()> {
	debug.log(1, format!("Loading '{}' ... ", options.input));
	let mut store = ByteStore::load(&options.input)?;
	debug.logln(1, format!("OK, {} bytes.", store.len()));

	let report = decode_header(&mut store, debug)?;

	if !options.quiet {
		print_summary(&report);
	}
	if options.print_header {
		print_header(&report.header);
	}

	report.tracker.ensure_repaired()
}

fn print_summary(report: &HeaderReport) {
	let total = report.tracker.total_flaw_count();
	if total == 0 {
		println!("No flaws found.");
		return;
	}

	for (kind, count) in report.tracker.summary() {
		println!("{:>6} x {}", count, kind);
	}
	if report.tracker.all_repaired() {
		println!("{} flaw(s) found, all of them were corrected (in memory only).", total);
	}
	else {
		println!("{} flaw(s) found, not all of them could be corrected.", total);
	}
}

fn print_header(header: &Header) {
	let signature: Vec<String> = header.signature.iter().map(|b| format!("{:02X}", b)).collect();
	println!("signature                       {}", signature.join(" "));
	println!("minor version                   0x{:04X}", header.minor_version);
	println!("major version                   0x{:04X}", header.major_version);
	println!("byte order                      0x{:04X}", header.byte_order);
	println!("sector size                     {} (shift {})", header.sector_size(), header.sector_shift);
	println!("mini sector size                {} (shift {})", header.mini_sector_size(), header.mini_sector_shift);
	println!("number of directory sectors     {}", header.number_of_directory_sectors);
	println!("number of FAT sectors           {}", header.number_of_fat_sectors);
	println!("first directory sector          {}", header.first_directory_sector_location);
	println!("transaction signature number    {}", header.transaction_signature);
	println!("mini stream cutoff size         {}", header.mini_stream_cutoff_size);
	println!("first mini FAT sector           {}", header.first_mini_fat_sector_location);
	println!("number of mini FAT sectors      {}", header.number_of_mini_fat_sectors);
	println!("first DIFAT sector              {}", header.first_difat_sector_location);
	println!("number of DIFAT sectors         {}", header.number_of_difat_sectors);
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn file_name_must_start_with_an_ascii_letter() {
		assert!(validate_input(String::from("report.doc")).is_ok());
		assert!(validate_input(String::from("Z")).is_ok());

		assert!(validate_input(String::from("1file.doc")).is_err());
		assert!(validate_input(String::from("/tmp/report.doc")).is_err());
		assert!(validate_input(String::from("./report.doc")).is_err());
		assert!(validate_input(String::from("ébauche.doc")).is_err());
	}

	#[test]
	fn empty_file_name_is_rejected() {
		assert_eq!(validate_input(String::new()), Err(String::from("the file name must not be empty")));
	}

	#[test]
	fn missing_file_is_a_fatal_error() {
		let options = Options { input: String::from("no such file.doc"), verbose: 0, print_header: false, quiet: true };
		assert!(process(&options, &mut Debug::silent()).is_err());
	}
}
