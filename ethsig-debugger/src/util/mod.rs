mod sig_down;

pub use sig_down::SigDown;
