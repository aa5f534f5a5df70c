macro_rules! w_section {
    ($buf:ident, $item:expr) => {
        write!($buf, "{}", $item)
    };
}

macro_rules! w_flag {
    ($item:expr) => {
        $item
    };
}

macro_rules! w_err {
    ($item:expr) => {
        $item
    };
}
