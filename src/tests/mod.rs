mod test_utils;
mod test_from_yaml;
mod test_move;
