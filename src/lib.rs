// Library root
// -----------
// This crate exposes a small library surface for the CLI. The binary
// (`main.rs`) uses these modules to implement the batch tagging flow.
//
// Module responsibilities:
// - `api`: Encapsulates HTTP interactions with the music catalog
//   (token grant, track search, track and artist lookup, cover image
//   download).
// - `cli`: Command line arguments.
// - `scan`: Finds supported audio files on disk and derives the search
//   title from the filename.
// - `tags`: Writes metadata and the embedded cover image into a file,
//   delegating the container format to the tag-writing library.
// - `run`: Drives the per-file pipeline and owns all terminal
//   interaction.
//
// Keeping this separation makes it easier to test the scanning and
// tag-writing logic without a network or a terminal attached.
pub mod api;
pub mod cli;
pub mod run;
pub mod scan;
pub mod tags;
