//! # CLI Module
//!
//! Command-line interface of the `tcv3-gen` binary.
//!
//! ## Commands
//!
//! | command  | effect                                                       |
//! |----------|--------------------------------------------------------------|
//! | `all`    | generate every type (`--gen_type all\|filter\|model\|object`) |
//! | `args`   | print the `Args:` block (`--type T --indent_blocks N`)       |
//! | `code`   | filter, model and object for `--type T`                      |
//! | `filter` | the TQL filter for `--type T`                                |
//! | `model`  | the models for `--type T`                                    |
//! | `object` | the object wrappers for `--type T`                           |
//!
//! Global options: `--schemas <DIR>` (default `schemas`), `--api-url <URL>`
//! to fetch schemas from a live API, `--header 'Name: value'`, `--root <DIR>`
//! (default `.`) and `--fmt`.
//!
//! Generation only overwrites: if a target file does not exist the command
//! fails without writing anything for that type.
//!
//! ## Examples
//!
//! ```bash
//! # Refresh the indicator model
//! tcv3-gen --root sdk model --type indicators
//!
//! # Regenerate every filter from the live API
//! tcv3-gen --api-url https://tc.example.com/api --header 'Authorization: TC token' \
//!     all --gen_type filter
//!
//! # Print an args block for a docstring two levels deep
//! tcv3-gen args --type cases --indent_blocks 2
//! ```

mod commands;

pub use commands::{run_cli, run_from_env, Cli, Commands, GenType, GlobalArgs};
