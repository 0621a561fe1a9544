pub mod peer;

pub use peer::TestPeer;
