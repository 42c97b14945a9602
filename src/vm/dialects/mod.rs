//! CPU dialects
//!
//! A dialect is an instruction library plus the engine its handlers run on.
//! Every dialect's engine implements [`Hardware`](crate::vm::Hardware), so a
//! host drives them all the same way.
//!
//! | Dialect | Engine     | Instructions |
//! |---------|------------|--------------|
//! | heads   | `HeadsCpu` | 91           |

pub mod heads;
