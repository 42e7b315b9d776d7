mod revalidate;
mod support;
