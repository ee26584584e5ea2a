//! Device control
//!
//! Everything that reaches the Android device through a shell: command
//! routing, gestures, text input and the `Driver` facade tying them to the
//! automation-service bridge.
//!
//! ## Architecture
//!
//! - `Session` - execution mode, relay/shell, selected device, cached IME
//! - `CommandRunner` / `Dispatcher` - runs commands through the local shell
//!   (co-located) or `adb -s <device>` (remote)
//! - `gesture` - randomised swipe planning
//! - `Driver` - high-level handle (taps, swipes, text, hierarchy, waits)
//!
//! ## Example
//!
//! ```rust,ignore
//! use android_uiauto::config::DriverConfig;
//! use android_uiauto::device::{Direction, Driver};
//!
//! let driver = Driver::new(DriverConfig::from_env())?;
//! driver.connect("emulator-5554").await?;
//!
//! driver.swipe(Direction::Up).await?;
//! if let Some(button) = driver.find_element("//node[@text='OK']").await {
//!     button.tap(&driver).await?;
//! }
//! ```

pub mod dispatcher;
pub mod driver;
pub mod gesture;
pub mod input;
pub mod session;

pub use dispatcher::{is_host_only, CommandLine, CommandRunner, Dispatcher, HOST_ONLY_COMMANDS};
pub use driver::Driver;
pub use gesture::{plan_swipe, Direction, SwipePlan};
pub use input::EditorAction;
pub use session::{ExecutionMode, Session};
