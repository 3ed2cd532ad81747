use std::fmt;
use std::str::FromStr;

/// Screens inside the tabbed (protected) area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Home,
    Scans,
    Camera,
    Treatment,
    Profile,
}

impl Tab {
    pub fn all() -> &'static [Tab] {
        &[Tab::Home, Tab::Scans, Tab::Camera, Tab::Treatment, Tab::Profile]
    }
}

/// Navigable locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Index,
    Login,
    Register,
    Otp,
    ForgotPassword,
    ResetPassword,
    Tabs(Tab),
}

/// Which side of the authentication boundary a route lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutePartition {
    Public,
    Protected,
}

impl Route {
    /// Where signed-out users land.
    pub const PUBLIC_ENTRY: Route = Route::Login;
    /// Where signed-in users land.
    pub const PROTECTED_ENTRY: Route = Route::Tabs(Tab::Home);

    pub fn partition(self) -> RoutePartition {
        match self {
            Route::Tabs(_) => RoutePartition::Protected,
            Route::Index
            | Route::Login
            | Route::Register
            | Route::Otp
            | Route::ForgotPassword
            | Route::ResetPassword => RoutePartition::Public,
        }
    }

    pub fn is_protected(self) -> bool {
        self.partition() == RoutePartition::Protected
    }

    pub fn path(self) -> &'static str {
        match self {
            Route::Index => "/",
            Route::Login => "/LoginScreen",
            Route::Register => "/RegisterScreen",
            Route::Otp => "/OTPScreen",
            Route::ForgotPassword => "/ForgotPasswordScreen",
            Route::ResetPassword => "/ResetPasswordScreen",
            Route::Tabs(Tab::Home) => "/(tabs)",
            Route::Tabs(Tab::Scans) => "/(tabs)/Scans",
            Route::Tabs(Tab::Camera) => "/(tabs)/Camera",
            Route::Tabs(Tab::Treatment) => "/(tabs)/Treatment",
            Route::Tabs(Tab::Profile) => "/(tabs)/Profile",
        }
    }

    /// Every route, public first.
    pub fn all() -> Vec<Route> {
        let mut routes = vec![
            Route::Index,
            Route::Login,
            Route::Register,
            Route::Otp,
            Route::ForgotPassword,
            Route::ResetPassword,
        ];
        routes.extend(Tab::all().iter().copied().map(Route::Tabs));
        routes
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Route {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Route::all()
            .into_iter()
            .find(|route| route.path() == trimmed)
            .or(match trimmed {
                "/(tabs)/index" => Some(Route::Tabs(Tab::Home)),
                _ => None,
            })
            .ok_or_else(|| format!("Unknown route: {value}"))
    }
}
