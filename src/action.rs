#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Quit,
    Navigate(Direction),
    Scroll(isize),
    EnterSearchMode,
    ExitSearchMode,
    ClearSearch,
    UpdateSearch(String),
    ToggleHideSystem,
    ToggleHideInaccessible,
    ToggleSelect,
    Terminate,
    OpenLocation,
    CycleTheme,
    ToggleHelp,
    DismissDialog,
    Refresh,
    RelaunchElevated,
    SelectAt(u16, u16),
    None,
}
