mod util;

mod vm {
    mod scenarios;
    mod controlflow;
    mod calls;
    mod entities;
    mod strings;
    mod builtins;
    mod arrays;
}
