//! Lucent Animation System
//!
//! Small, explicit animation primitives for glass controls.
//!
//! # Features
//!
//! - **Spring Physics**: RK4-integrated springs with stiffness, damping, mass
//! - **Tweens**: fixed-duration eased transitions (cross-fades, scale pops)
//! - **Scheduler**: ticks every live animation from one place
//! - **Interruptible**: retargeting keeps the current value and velocity

pub mod easing;
pub mod scheduler;
pub mod spring;
pub mod tween;

pub use easing::Easing;
pub use scheduler::{AnimationScheduler, SpringId, TweenId};
pub use spring::{Spring, SpringConfig};
pub use tween::Tween;
