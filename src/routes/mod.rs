//! Route registration: handlers declare method, path pattern and signature; a scan over a module
//! namespace collects them into a [`RouteTable`].

mod table;
pub use table::{RouteEntry, RouteTable};

use crate::binding::{HandlerFuture, Kwargs, Signature};
use crate::state::AppState;

/// Link-time record of one declared handler. Submitted by [`route!`](crate::route).
pub struct HandlerDecl {
    pub method: &'static str,
    pub path: &'static str,
    pub name: &'static str,
    /// `module_path!()` of the declaring module; matched by [`RouteTable::scan`].
    pub module: &'static str,
    pub signature: fn() -> Signature,
    pub call: fn(AppState, Kwargs) -> HandlerFuture,
}

inventory::collect!(HandlerDecl);

/// Declare an async handler `fn(AppState, Kwargs) -> HandlerResult` under a method and path.
///
/// ```ignore
/// async fn greeting(_: AppState, mut kw: Kwargs) -> HandlerResult { ... }
/// webplan::route!(GET "/greeting/{name}", greeting, Signature::new().keyword("name").keyword("request"));
/// ```
#[macro_export]
macro_rules! route {
    ($method:ident $path:literal, $handler:path, $signature:expr $(,)?) => {
        const _: () = {
            fn call(
                state: $crate::state::AppState,
                kw: $crate::binding::Kwargs,
            ) -> $crate::binding::HandlerFuture {
                ::std::boxed::Box::pin($handler(state, kw))
            }

            fn signature() -> $crate::binding::Signature {
                $signature
            }

            $crate::inventory::submit! {
                $crate::routes::HandlerDecl {
                    method: ::std::stringify!($method),
                    path: $path,
                    name: ::std::stringify!($handler),
                    module: ::std::module_path!(),
                    signature,
                    call,
                }
            }
        };
    };
}
