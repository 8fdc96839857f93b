//! # VetPOS Counter Entry Point
//!
//! The setup lives in lib.rs so it can be tested.

#[tokio::main]
async fn main() {
    if let Err(e) = vetpos_counter::run().await {
        eprintln!("vetpos-counter: {}", e);
        std::process::exit(1);
    }
}
