//! The navigation bar shown on pages behind the auth guard.

use maud::{Markup, html};

use crate::endpoints;

struct Link {
    url: &'static str,
    title: &'static str,
    is_current: bool,
}

/// The site navigation, rendered as a top bar on large screens and a fixed
/// bottom bar on small screens.
pub struct NavBar {
    links: Vec<Link>,
}

impl NavBar {
    /// Create the navigation bar, marking the link matching `active_endpoint`
    /// as the current page.
    pub fn new(active_endpoint: &str) -> Self {
        let links = vec![
            Link {
                url: endpoints::ROOT,
                title: "Dashboard",
                is_current: active_endpoint == endpoints::ROOT,
            },
            Link {
                url: endpoints::NEW_TRANSACTION_VIEW,
                title: "New Transaction",
                is_current: active_endpoint == endpoints::NEW_TRANSACTION_VIEW,
            },
            Link {
                url: endpoints::NEW_CATEGORY_VIEW,
                title: "New Category",
                is_current: active_endpoint == endpoints::NEW_CATEGORY_VIEW,
            },
            Link {
                url: endpoints::LOG_OUT,
                title: "Log Out",
                is_current: false,
            },
        ];

        Self { links }
    }

    /// Render the navigation bar.
    pub fn into_html(self) -> Markup {
        let link_style = |is_current: bool| {
            if is_current {
                "block py-2 px-3 rounded-sm text-white bg-blue-700 lg:bg-transparent \
                    lg:text-blue-700 lg:p-0 lg:dark:text-blue-500"
            } else {
                "block py-2 px-3 rounded-sm text-gray-900 hover:bg-gray-100 \
                    lg:hover:bg-transparent lg:hover:text-blue-700 lg:p-0 dark:text-white \
                    lg:dark:hover:text-blue-500 dark:hover:bg-gray-700 dark:hover:text-white \
                    lg:dark:hover:bg-transparent"
            }
        };

        html! {
            nav class="hidden lg:block bg-white border-gray-200 dark:bg-gray-900 w-full"
            {
                div class="max-w-screen-xl flex flex-wrap items-center justify-between mx-auto p-4"
                {
                    a href=(endpoints::ROOT) class="flex items-center space-x-3"
                    {
                        img src="/static/favicon-32x32.png" class="h-8" alt="logo";
                        span class="self-center text-2xl font-semibold whitespace-nowrap dark:text-white"
                        {
                            "FinTrack"
                        }
                    }

                    ul class="font-medium flex flex-row space-x-8"
                    {
                        @for navigation_link in &self.links
                        {
                            li
                            {
                                a
                                    href=(navigation_link.url)
                                    class=(link_style(navigation_link.is_current))
                                    aria-current=[navigation_link.is_current.then_some("page")]
                                {
                                    (navigation_link.title)
                                }
                            }
                        }
                    }
                }
            }

            nav
                class="lg:hidden fixed bottom-0 left-0 z-40 w-full bg-white border-t \
                    border-gray-200 dark:bg-gray-900 dark:border-gray-700 \
                    pb-[env(safe-area-inset-bottom)]"
            {
                ul class="font-medium flex flex-row justify-around p-2"
                {
                    @for navigation_link in &self.links
                    {
                        li
                        {
                            a
                                href=(navigation_link.url)
                                class=(link_style(navigation_link.is_current))
                                aria-current=[navigation_link.is_current.then_some("page")]
                            {
                                (navigation_link.title)
                            }
                        }
                    }
                }
            }
        }
    }
}
