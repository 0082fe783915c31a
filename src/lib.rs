// Library root
// -----------
// The `devtrans` binary is a thin shell over these modules so each piece
// can be tested without a terminal or a real server.
//
// Module responsibilities:
// - `config`: resolves base URL and token (env, config file, default).
// - `expiry`: turns the service's expiry timestamp into display text.
// - `api`: HTTP calls to the service (upload, download, version, binary).
// - `update`: replaces the running executable via a staged file.
// - `ui`: printing and spinners.
// - `cli`: argument parsing.
pub mod api;
pub mod cli;
pub mod config;
pub mod expiry;
pub mod ui;
pub mod update;
