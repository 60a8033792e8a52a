//! # 1-安全 Petri 网模型
//!
//! 设库所集合 `P` 与迁移集合 `T`。每个库所至多持有一个 token，故标识
//! `M ∈ {0,1}^{|P|}`。迁移 `t` 携带前集 `pre(t)` 与后集 `post(t)`：
//!
//! * `t` **可激发** 当且仅当 `∀p ∈ pre(t): M[p] = 1`，前集为空的迁移恒可激发；
//! * 发射后先清空 `pre(t)`，再标记 `post(t)`，同时属于两者的库所保持标记。
//!
//! 库所与迁移的编号由标识符升序排序决定，网一经构造即不可变。
//!
//! ## 示例
//!
//! ```rust
//! use pn_reach::net::*;
//!
//! let mut builder = NetBuilder::new("fork");
//! builder
//!     .add_place("p0", true)
//!     .add_place("p1", false)
//!     .add_transition("t0")
//!     .add_arc("p0", "t0")
//!     .add_arc("t0", "p1");
//! let net = builder.build();
//!
//! let marking = net.initial_marking();
//! let t0 = net.transition_id("t0").unwrap();
//! assert_eq!(net.enabled_transitions(marking), vec![t0]);
//! let next = net.fire_transition(marking, t0).unwrap();
//! assert_eq!(next.to_bits(), vec![0, 1]);
//! ```

pub mod core;
pub mod ids;
pub mod index_vec;
pub mod io;
pub mod structure;

pub use self::core::{ArcDiagnostic, DiagnosticReport, FireError, Net, NetBuilder};
pub use ids::{PlaceId, TransitionId};
pub use index_vec::{Idx, IndexVec};
pub use io::{IoError, NetDescription, load_net};
pub use structure::{Arc, ArcDirection, Marking, Place, PlaceSet, Transition};
