//! The `lumina` command-line compiler. Thin by design: all real logic
//! lives in the library crate so it stays testable without spawning a
//! process, mirroring the teacher's `oric` binary's `fn main()`.

fn main() {
    lumina_driver::run_cli();
}
