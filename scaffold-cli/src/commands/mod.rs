pub mod check;
pub mod diff;
pub mod new;
pub mod vars;
