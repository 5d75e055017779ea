mod border_loops;
mod check_front;

pub use border_loops::{BorderLoop, BorderLoops};
pub use check_front::CheckFront;
