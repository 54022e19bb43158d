use strum::IntoStaticStr;
use tick_store::Action;

/// Actions of the demo host
///
/// The type tag is the snake_case variant name.
#[derive(Debug, Clone, PartialEq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum HostAction {
    /// Store bootstrap
    #[strum(serialize = "@@INIT")]
    Init,

    /// A new frame started
    Tick { frame: u64 },

    /// ## Counter
    Increment,
    Reset,

    /// ## Todos
    AddTodo(String),
    ToggleTodo(usize),
    /// Todos arrived from a (simulated) background load
    TodosLoaded(Vec<String>),
}

impl Action for HostAction {
    fn action_type(&self) -> &str {
        let tag: &'static str = self.into();
        tag
    }

    fn bootstrap() -> Self {
        HostAction::Init
    }
}
